//! Integration tests for foldersync-jmap
//!
//! Uses wiremock to simulate a JMAP server and verifies end-to-end
//! behavior of session discovery, mailbox listing and change paging,
//! down to the folders committed into an in-memory SQLite store.

mod common;

mod test_refresh_folder_list;
mod test_session;
