//! Queue-name derivation and per-process instance tokens.
//!
//! Queue names are assembled from ordered fragments (service, namespace,
//! role, instance token). Empty fragments are dropped so an unset namespace
//! never leaves a stray delimiter in the name.

use uuid::Uuid;

/// Delimiter between queue-name fragments.
pub const SEPARATOR: char = ':';

/// Derives a queue name by joining the non-empty fragments with [`SEPARATOR`].
///
/// Deterministic and pure. An all-empty fragment list yields an empty string.
pub fn queue_name<I>(fragments: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut name = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            continue;
        }
        if !name.is_empty() {
            name.push(SEPARATOR);
        }
        name.push_str(fragment);
    }
    name
}

/// Returns a fresh per-process unique token for output-queue names.
///
/// Output queues are exclusive to this process; the token keeps their names
/// from colliding across instances of the same service consumer.
#[must_use]
pub fn instance_token() -> String {
    Uuid::new_v4().to_string()
}
