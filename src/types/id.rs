// ABOUTME: Phantom-typed ARNs for compile-time type safety.
// ABOUTME: Prevents accidental swapping of task definition revisions and task ARNs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum RevisionMarker {}
pub enum TaskMarker {}

/// A type-safe ARN that prevents accidental mixing of different resource kinds.
///
/// Using phantom types, this ensures you can't accidentally pass a `TaskArn`
/// where a `RevisionArn` is expected, catching bugs at compile time.
#[must_use = "ARNs reference cluster resources and should not be ignored"]
pub struct Arn<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Arn<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The resource part after the last `/` (the whole value if there is none).
    fn resource(&self) -> &str {
        self.value
            .rsplit_once('/')
            .map(|(_, resource)| resource)
            .unwrap_or(&self.value)
    }
}

impl Arn<RevisionMarker> {
    /// Family name of the revision.
    ///
    /// Works for full ARNs (`arn:aws:ecs:...:task-definition/web:12`),
    /// `family:revision` shorthands and bare family names.
    pub fn family(&self) -> &str {
        let resource = self.resource();
        match resource.rsplit_once(':') {
            Some((family, revision)) if revision.parse::<u64>().is_ok() => family,
            _ => resource,
        }
    }

    /// Revision number, when the reference carries one.
    pub fn revision(&self) -> Option<u64> {
        self.resource()
            .rsplit_once(':')
            .and_then(|(_, revision)| revision.parse().ok())
    }
}

// Manual trait implementations that don't require T to implement the trait.

impl<T> std::fmt::Debug for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arn").field("value", &self.value).finish()
    }
}

impl<T> Clone for Arn<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Arn<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Arn<T> {}

impl<T> Hash for Arn<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Arn<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Arn<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type RevisionArn = Arn<RevisionMarker>;
pub type TaskArn = Arn<TaskMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_and_revision_from_full_arn() {
        let arn = RevisionArn::new("arn:aws:ecs:eu-west-1:123456789012:task-definition/web:12");
        assert_eq!(arn.family(), "web");
        assert_eq!(arn.revision(), Some(12));
    }

    #[test]
    fn family_from_shorthand() {
        let arn = RevisionArn::new("web-worker:3");
        assert_eq!(arn.family(), "web-worker");
        assert_eq!(arn.revision(), Some(3));
    }

    #[test]
    fn bare_family_has_no_revision() {
        let arn = RevisionArn::new("web");
        assert_eq!(arn.family(), "web");
        assert_eq!(arn.revision(), None);
    }
}
