//! The built-in Reaction Executor catalog (§4.3). One `Executor` impl per
//! `reaction.name`, grounded in `scheduler/reactions.py`.

mod drive;
mod facebook;
mod github;
mod internal;
mod smtp;
mod spotify;

pub use drive::{CreateFileExecutor, CreateFolderExecutor, ShareFileExecutor};
pub use facebook::CreatePostExecutor;
pub use github::CreateIssueExecutor;
pub use internal::{LogMessageExecutor, SendNotificationExecutor};
pub use smtp::SendEmailExecutor;
pub use spotify::{AddToPlaylistExecutor, CreatePlaylistExecutor, StartPlaybackExecutor};
