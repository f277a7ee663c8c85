use caliope_core::loyalty::{LoyaltyStatus, TierTable};

use crate::commands::CommandResult;

pub fn run(points: u64) -> CommandResult {
    let status = TierTable::default().status(points);
    CommandResult::success("level", describe(&status))
}

fn describe(status: &LoyaltyStatus) -> String {
    let percent = (status.progress.progress * 100.0).round();
    if status.progress.points_to_next == 0 {
        return format!(
            "{} points: level {} ({}), top tier reached",
            status.points, status.level.level, status.level.name
        );
    }
    format!(
        "{} points: level {} ({}), {percent}% of the way, {} points to the next tier",
        status.points, status.level.level, status.level.name, status.progress.points_to_next
    )
}
