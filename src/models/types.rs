use serde::{Deserialize, Serialize};

/// String-backed identifier as it appears in room documents and flag names.
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)] // JSON = plain string
        pub struct $name(pub String);

        impl $name {
            #[inline]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
            #[inline]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }
        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_key!(RoomId);
define_key!(HotspotId);
define_key!(ItemId);

/// Player verbs as selected in the verb bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    Look,
    Talk,
    PickUp,
    Use,
    Open,
}

impl Verb {
    pub const ALL: [Verb; 5] = [Verb::Look, Verb::Talk, Verb::PickUp, Verb::Use, Verb::Open];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Look => "LOOK",
            Verb::Talk => "TALK",
            Verb::PickUp => "PICK_UP",
            Verb::Use => "USE",
            Verb::Open => "OPEN",
        }
    }

    /// Label as shown in the sentence line ("Pick up", "Look").
    pub fn label(&self) -> &'static str {
        match self {
            Verb::Look => "Look",
            Verb::Talk => "Talk",
            Verb::PickUp => "Pick up",
            Verb::Use => "Use",
            Verb::Open => "Open",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "LOOK" => Some(Verb::Look),
            "TALK" => Some(Verb::Talk),
            "PICK_UP" | "PICKUP" | "TAKE" => Some(Verb::PickUp),
            "USE" => Some(Verb::Use),
            "OPEN" => Some(Verb::Open),
            _ => None,
        }
    }
}

impl core::fmt::Display for Verb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive on the top/left edge, exclusive on the bottom/right edge.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

/// Abstract hotspot states, in resolution precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotState {
    Broken,
    Open,
    Locked,
    Inspected,
}

impl HotspotState {
    /// `broken > open > locked > inspected`
    pub const PRECEDENCE: [HotspotState; 4] = [
        HotspotState::Broken,
        HotspotState::Open,
        HotspotState::Locked,
        HotspotState::Inspected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotState::Broken => "broken",
            HotspotState::Open => "open",
            HotspotState::Locked => "locked",
            HotspotState::Inspected => "inspected",
        }
    }
}
