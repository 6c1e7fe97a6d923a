/*
[INPUT]:  Every task status crossed with zero / non-zero error counts
[OUTPUT]: Verification of the stop / retry-failed action matrix
[POS]:    Integration tests - action gate
[UPDATE]: When action preconditions change
*/

use rstest::rstest;
use secprobe_adapter::TaskStatus;
use secprobe_console::TaskAction;
use secprobe_console::gate::actions_for_status;

#[rstest]
#[case(TaskStatus::Pending, 0, true, false)]
#[case(TaskStatus::Pending, 4, true, false)]
#[case(TaskStatus::Running, 0, true, false)]
#[case(TaskStatus::Running, 4, true, false)]
#[case(TaskStatus::Completed, 0, false, false)]
#[case(TaskStatus::Completed, 4, false, true)]
#[case(TaskStatus::Stopped, 0, false, false)]
#[case(TaskStatus::Stopped, 4, false, true)]
#[case(TaskStatus::Error, 0, false, false)]
#[case(TaskStatus::Error, 4, false, true)]
fn test_action_matrix(
    #[case] status: TaskStatus,
    #[case] error_count: u32,
    #[case] stop: bool,
    #[case] retry: bool,
) {
    let actions = actions_for_status(status, error_count);
    assert_eq!(actions.contains(TaskAction::Stop), stop);
    assert_eq!(actions.contains(TaskAction::RetryFailed), retry);
}

#[test]
fn test_stop_and_retry_never_offered_together() {
    for status in TaskStatus::ALL {
        for error_count in [0, 1, 100] {
            let actions = actions_for_status(status, error_count);
            assert!(
                !(actions.contains(TaskAction::Stop) && actions.contains(TaskAction::RetryFailed)),
                "{status} with {error_count} errors"
            );
        }
    }
}
