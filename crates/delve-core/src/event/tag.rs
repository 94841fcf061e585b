// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The character separating the segments of an [`EventTag`].
pub const TAG_SEPARATOR: char = '.';

/// A hierarchical, dot-delimited event identifier such as `Game.Combat.Damage.Dealt`.
///
/// Tags are immutable and cheap to clone. The empty tag is the invalid/root
/// tag: it has no parent and cannot be registered or broadcast.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTag {
    name: Arc<str>,
}

impl EventTag {
    /// Parses and validates a tag.
    ///
    /// Every segment must be non-empty and contain only ASCII alphanumerics,
    /// `_` or `-`.
    pub fn new(name: &str) -> Result<Self, TagError> {
        if name.is_empty() {
            return Err(TagError::Empty);
        }
        for segment in name.split(TAG_SEPARATOR) {
            if segment.is_empty() {
                return Err(TagError::EmptySegment {
                    tag: name.to_string(),
                });
            }
            if let Some(ch) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            {
                return Err(TagError::InvalidCharacter {
                    tag: name.to_string(),
                    character: ch,
                });
            }
        }
        Ok(Self { name: name.into() })
    }

    /// Returns the empty (invalid) tag.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns `true` unless this is the empty tag.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }

    /// Returns the full dotted name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Iterates over the segments from root-most to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name
            .split(TAG_SEPARATOR)
            .filter(|segment| !segment.is_empty())
    }

    /// Number of segments; 0 for the empty tag.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns the direct parent, obtained by dropping the last segment.
    ///
    /// Top-level tags and the empty tag have no parent.
    pub fn parent(&self) -> Option<EventTag> {
        let cut = self.name.rfind(TAG_SEPARATOR)?;
        Some(Self {
            name: self.name[..cut].into(),
        })
    }

    /// Iterates over every ancestor, nearest first. The tag itself is excluded.
    pub fn ancestors(&self) -> impl Iterator<Item = EventTag> {
        std::iter::successors(self.parent(), EventTag::parent)
    }

    /// Returns the tag followed by all of its ancestors, nearest first.
    ///
    /// This is the set of registry keys notified when an event carrying this
    /// tag is broadcast.
    pub fn lineage(&self) -> Vec<EventTag> {
        if !self.is_valid() {
            return Vec::new();
        }
        let mut lineage = Vec::with_capacity(self.depth());
        lineage.push(self.clone());
        lineage.extend(self.ancestors());
        lineage
    }

    /// Returns `true` if `self` is a strict descendant of `ancestor`.
    pub fn is_child_of(&self, ancestor: &EventTag) -> bool {
        ancestor.is_valid()
            && self.name.len() > ancestor.name.len()
            && self.name.starts_with(ancestor.as_str())
            && self.name[ancestor.name.len()..].starts_with(TAG_SEPARATOR)
    }

    /// Returns `true` if `self` equals `other` or descends from it.
    ///
    /// A listener registered on `other` receives events tagged with `self`
    /// exactly when this returns `true`.
    pub fn matches(&self, other: &EventTag) -> bool {
        (self.is_valid() && self == other) || self.is_child_of(other)
    }
}

impl Default for EventTag {
    fn default() -> Self {
        Self { name: Arc::from("") }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(&self.name)
        } else {
            f.write_str("<none>")
        }
    }
}

impl fmt::Debug for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventTag({self})")
    }
}

impl FromStr for EventTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Reasons a string cannot be turned into an [`EventTag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The string was empty.
    Empty,
    /// The string had a leading, trailing or doubled separator.
    EmptySegment {
        /// The rejected input.
        tag: String,
    },
    /// A segment contained a character outside `[A-Za-z0-9_-]`.
    InvalidCharacter {
        /// The rejected input.
        tag: String,
        /// The first offending character.
        character: char,
    },
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Empty => write!(f, "Event tag is empty"),
            TagError::EmptySegment { tag } => {
                write!(f, "Event tag '{tag}' contains an empty segment")
            }
            TagError::InvalidCharacter { tag, character } => {
                write!(f, "Event tag '{tag}' contains invalid character '{character}'")
            }
        }
    }
}

impl std::error::Error for TagError {}
