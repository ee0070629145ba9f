//! Credentials for network operations
//!
//! SSH URLs authenticate through the SSH agent, HTTPS through the git
//! credential helper. libgit2 calls back again after a rejected
//! credential, so attempts are capped.

use git2::{Cred, RemoteCallbacks, Repository};

const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Callbacks carrying the credentials handler for fetch and push
pub(super) fn remote_callbacks<'a>(repo: &Repository) -> RemoteCallbacks<'a> {
    let cfg = repo.config().ok();
    let mut attempts = 0;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(&format!(
                "authentication failed for {}",
                url
            )));
        }

        if allowed.is_ssh_key() {
            if let Some(user) = username_from_url {
                return Cred::ssh_key_from_agent(user);
            }
        }
        if allowed.is_user_pass_plaintext() {
            if let Some(cfg) = &cfg {
                if let Ok(cred) = Cred::credential_helper(cfg, url, username_from_url) {
                    return Ok(cred);
                }
            }
        }
        Cred::default()
    });

    callbacks
}
