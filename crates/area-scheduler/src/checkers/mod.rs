//! The built-in Action Checker catalog (§4.2). One free-function-shaped
//! `Checker` impl per `action.name`, grounded in `scheduler/actions.py`.

mod drive;
mod facebook;
mod github;
mod gmail;
mod spotify;
mod time;

pub use drive::{NewFileInFolderChecker, NewFileUploadedChecker};
pub use facebook::{NewPostCreatedChecker, PostContainsKeywordChecker};
pub use github::{NewIssueCreatedChecker, NewPrOpenedChecker, NewStarOnRepoChecker};
pub use gmail::{EmailReceivedFromChecker, EmailSubjectContainsChecker};
pub use spotify::{PlaybackStartedChecker, TrackAddedToPlaylistChecker, TrackSavedChecker};
pub use time::{IntervalElapsedChecker, TimeMatchesChecker};
