use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::models::{Project, User};

pub trait Identified {
    fn id(&self) -> i64;
}

impl Identified for Project {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for User {
    fn id(&self) -> i64 {
        self.id
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Projects whose title contains `query`, ignoring case. Blank query keeps all.
pub fn filter_projects<'a>(projects: &'a [Project], query: &str) -> Vec<&'a Project> {
    let needle = query.trim().to_lowercase();
    projects
        .iter()
        .filter(|p| needle.is_empty() || contains_ci(&p.title, &needle))
        .collect()
}

/// Users whose username or email contains `query`, ignoring case.
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let needle = query.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            needle.is_empty() || contains_ci(&u.username, &needle) || contains_ci(&u.email, &needle)
        })
        .collect()
}

/// Collaborator autocomplete: matching users not already picked, at most `limit`.
pub fn suggest_collaborators<'a>(
    users: &'a [User],
    query: &str,
    selected: &BTreeSet<i64>,
    limit: usize,
) -> Vec<&'a User> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    filter_users(users, query)
        .into_iter()
        .filter(|u| !selected.contains(&u.id))
        .take(limit)
        .collect()
}

/// Drop the item with `id` from a local list after the server confirmed the delete.
pub fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: i64) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

/// Lets only the last of a burst of inputs through.
///
/// Each call to [`Debouncer::settle`] waits for the quiet period and yields its
/// value only if no newer call started in the meantime. Meant for long-lived
/// callers that feed it keystrokes; the CLI runs one search per process and
/// builds its state with a zero delay.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        (self.generation.load(Ordering::SeqCst) == ticket).then_some(value)
    }
}
