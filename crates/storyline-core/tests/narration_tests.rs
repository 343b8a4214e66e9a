use pretty_assertions::assert_eq;
use serde::Serialize;
use storyline_core::prelude::*;
use storyline_core::{ExpectationMismatch, Narrator, TestOutcome};
use storyline_graph::GraphCache;
use storyline_test_utils::{NarrationEvent, RecordingNotifier, RecordingSink, RecordingSinkModule};

#[derive(Default)]
struct MyStoryTest;

impl MyStoryTest {
    fn the_first_step_takes_arguments(&self, narrator: &Narrator, count: &str) -> Result<(), StepError> {
        narrator.step("theFirstStepTakes_$1_arguments", &args![count], || Ok(()))
    }

    fn the_second_step_takes_the_list(&self, narrator: &Narrator, numbers: Vec<i32>) -> Result<(), StepError> {
        narrator.step("while_the_second_step_takes_the_list_$1", &args![numbers], || Ok(()))
    }
}

fn story_class(name: &str) -> TestClass<MyStoryTest> {
    TestClass::with_default(name).with_module::<RecordingSinkModule>()
}

fn sink_of(runner: &ClassRunner<MyStoryTest>) -> std::sync::Arc<RecordingSink> {
    runner.graph().resolve::<RecordingSink>().unwrap()
}

#[test]
fn test_story_narrates_each_step() {
    let class = story_class("MyStoryTest").method(
        MethodDecl::story("theTitleOfMyStory"),
        |test: &mut MyStoryTest, narrator: &Narrator| {
            test.the_first_step_takes_arguments(narrator, "one")?;
            test.the_second_step_takes_the_list(narrator, vec![1, 2, 3])?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    let outcomes = runner.run(&mut RecordingNotifier::new());
    assert_eq!(outcomes, vec![TestOutcome::Passed]);

    let sink = sink_of(&runner);
    assert_eq!(
        sink.narration(),
        vec![
            "Story \"The title of my story\"",
            "The first step takes \"one\" arguments",
            "While the second step takes the list 1, 2 and 3",
        ]
    );
    let events = sink.events();
    assert_eq!(
        events.last(),
        Some(&NarrationEvent::StoryEnds {
            class: "MyStoryTest".to_string(),
            text: "Story \"The title of my story\"".to_string(),
        })
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, NarrationEvent::StepEnds { .. }))
            .count(),
        2
    );
}

#[test]
fn test_story_id_is_appended() {
    let class = story_class("IdentifiedStory").method(
        MethodDecl::story("aStoryWithAnId").with_story_id("STORY-7"),
        |_: &mut MyStoryTest, _: &Narrator| Ok(()),
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    runner.run(&mut RecordingNotifier::new());

    assert_eq!(
        sink_of(&runner).narration(),
        vec!["Story \"A story with an id\" [STORY-7]"]
    );
}

#[test]
fn test_failing_step_skips_end_events() {
    let class = story_class("FailingStory").method(
        MethodDecl::story("aFailingStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            narrator.step("a_step_that_fails", &[], || Err::<(), _>(Failure::new("io")))?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    let outcomes = runner.run(&mut RecordingNotifier::new());
    assert_eq!(outcomes, vec![TestOutcome::Failed("io".to_string())]);

    let events = sink_of(&runner).events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], NarrationEvent::StoryBegins { .. }));
    assert!(matches!(events[1], NarrationEvent::StepBegins { .. }));
}

#[test]
fn test_expected_failure_is_handled_inside_story() {
    let class = story_class("ExpectingStory").method(
        MethodDecl::story("readingAMissingFile"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            let decl = MethodDecl::step("the_file_$1_is_read")
                .expecting(ExpectationSpec::new("io").with_message("missing .*"));
            let outcome = narrator.intercept(&decl, &args!["a.txt"], || {
                Err::<(), _>(Failure::with_message("io.not_found", "missing a.txt"))
            })?;
            if outcome.is_handled() {
                Ok(())
            } else {
                Err(TestError::assertion("failure not handled"))
            }
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    assert_eq!(runner.run(&mut RecordingNotifier::new()), vec![TestOutcome::Passed]);
    assert_eq!(
        sink_of(&runner).narration()[1],
        "The file \"a.txt\" is read"
    );
}

#[test]
fn test_unexpected_kind_surfaces_as_harness_failure() {
    let class = story_class("WrongKindStory").method(
        MethodDecl::story("aStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            let decl = MethodDecl::step("a_step").expecting(ExpectationSpec::new("io"));
            narrator.intercept(&decl, &[], || Err::<(), _>(Failure::new("parse")))?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    let mut notifier = RecordingNotifier::new();
    let outcomes = runner.run(&mut notifier);

    let expected = ExpectationMismatch::UnexpectedKind {
        expected: "io".into(),
        actual: Failure::new("parse"),
    };
    assert_eq!(outcomes, vec![TestOutcome::Failed(expected.to_string())]);
}

#[test]
fn test_missing_expected_failure_surfaces_as_harness_failure() {
    let class = story_class("NoFailureStory").method(
        MethodDecl::story("aStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            let decl = MethodDecl::step("a_step").expecting(ExpectationSpec::new("io"));
            narrator.intercept(&decl, &[], || Ok(()))?;
            Ok(())
        },
    );

    let report = storyline_core::run_class_with(
        RunnerKind::Story,
        class,
        &GraphCache::new(),
        storyline_core::RunnerConfig::default(),
    )
    .unwrap();
    assert_eq!(
        report.outcome("aStory"),
        Some(&TestOutcome::Failed(
            "expected failure of kind 'io' but none occurred".to_string()
        ))
    );
}

#[test]
fn test_finalizer_is_not_narrated() {
    let class = story_class("FinalizingStory").method(
        MethodDecl::story("aStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            narrator.step("DROP", &[], || Ok(()))?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    runner.run(&mut RecordingNotifier::new());
    assert_eq!(sink_of(&runner).narration(), vec!["Story \"A story\""]);
}

#[derive(Serialize)]
struct Account {
    owner: String,
    balance: u32,
}

#[test]
fn test_parameter_templates_render_fields() {
    let class = story_class("TemplatedStory").method(
        MethodDecl::story("aStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            let account = Value::record(&Account {
                owner: "ann".to_string(),
                balance: 10,
            });
            let decl = MethodDecl::step("the_account_$1_is_opened")
                .with_templates([Some("of ${owner} with ${balance} and ${currency}")]);
            narrator.intercept(&decl, &[account], || Ok(()))?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Story, class, &cache).unwrap();
    runner.run(&mut RecordingNotifier::new());
    assert_eq!(
        sink_of(&runner).narration()[1],
        "The account of \"ann\" with 10 and <field_not_found> is opened"
    );
}

#[test]
fn test_plain_runner_does_not_frame_stories() {
    let class = story_class("PlainStory").method(
        MethodDecl::story("aStory"),
        |_: &mut MyStoryTest, narrator: &Narrator| {
            narrator.step("a_step", &[], || Ok(()))?;
            Ok(())
        },
    );

    let cache = GraphCache::new();
    let mut runner = ClassRunner::new(RunnerKind::Plain, class, &cache).unwrap();
    runner.run(&mut RecordingNotifier::new());
    assert_eq!(sink_of(&runner).narration(), vec!["A step"]);
}
