//! Feature negotiation.
//!
//! An engine announces capabilities with lines like
//! `feature ping=1 san=1 myname="Fairy-Max 5.0" done=1`. Every pair gets an
//! answer: `accepted <name>` for keys in the closed [`FeatureKey`] schema with
//! a well-typed value, `rejected <name>` for everything else.

/// Value type a feature key expects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
    /// `0` or `1`
    Bool,
    Int,
    /// Double-quoted text
    Str,
}

/// Every feature the referee understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    Ping,
    SetBoard,
    PlayOther,
    San,
    UserMove,
    Time,
    Draw,
    Sigint,
    Sigterm,
    Reuse,
    Analyze,
    MyName,
    Variants,
    Colors,
    Ics,
    Name,
    Pause,
    Done,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 18] = [
        FeatureKey::Ping,
        FeatureKey::SetBoard,
        FeatureKey::PlayOther,
        FeatureKey::San,
        FeatureKey::UserMove,
        FeatureKey::Time,
        FeatureKey::Draw,
        FeatureKey::Sigint,
        FeatureKey::Sigterm,
        FeatureKey::Reuse,
        FeatureKey::Analyze,
        FeatureKey::MyName,
        FeatureKey::Variants,
        FeatureKey::Colors,
        FeatureKey::Ics,
        FeatureKey::Name,
        FeatureKey::Pause,
        FeatureKey::Done,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FeatureKey::Ping => "ping",
            FeatureKey::SetBoard => "setboard",
            FeatureKey::PlayOther => "playother",
            FeatureKey::San => "san",
            FeatureKey::UserMove => "usermove",
            FeatureKey::Time => "time",
            FeatureKey::Draw => "draw",
            FeatureKey::Sigint => "sigint",
            FeatureKey::Sigterm => "sigterm",
            FeatureKey::Reuse => "reuse",
            FeatureKey::Analyze => "analyze",
            FeatureKey::MyName => "myname",
            FeatureKey::Variants => "variants",
            FeatureKey::Colors => "colors",
            FeatureKey::Ics => "ics",
            FeatureKey::Name => "name",
            FeatureKey::Pause => "pause",
            FeatureKey::Done => "done",
        }
    }

    /// Exact (case-sensitive) lookup, as the protocol requires
    #[must_use]
    pub fn from_name(name: &str) -> Option<FeatureKey> {
        FeatureKey::ALL.into_iter().find(|k| k.name() == name)
    }

    #[must_use]
    pub const fn kind(self) -> FeatureKind {
        match self {
            FeatureKey::MyName | FeatureKey::Variants => FeatureKind::Str,
            FeatureKey::Done => FeatureKind::Int,
            _ => FeatureKind::Bool,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FeatureValue {
    fn parse(kind: FeatureKind, raw: &str, quoted: bool) -> Option<FeatureValue> {
        match kind {
            FeatureKind::Str if quoted => Some(FeatureValue::Str(raw.to_string())),
            FeatureKind::Str => None,
            _ if quoted => None,
            FeatureKind::Bool => match raw {
                "0" => Some(FeatureValue::Bool(false)),
                "1" => Some(FeatureValue::Bool(true)),
                _ => None,
            },
            FeatureKind::Int => raw.parse().ok().map(FeatureValue::Int),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            FeatureValue::Bool(b) => Some(b),
            FeatureValue::Int(n) => Some(n != 0),
            FeatureValue::Str(_) => None,
        }
    }
}

/// Outcome for one `name=value` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureItem {
    Accepted { key: FeatureKey, value: FeatureValue },
    Rejected { name: String },
}

impl FeatureItem {
    /// The acknowledgement the engine expects
    #[must_use]
    pub fn reply(&self) -> String {
        match self {
            FeatureItem::Accepted { key, .. } => format!("accepted {}", key.name()),
            FeatureItem::Rejected { name } => format!("rejected {name}"),
        }
    }
}

/// Parse the body of a `feature` line (everything after `feature `).
///
/// Parsing stops at the first token without `=`.
#[must_use]
pub fn parse_features(body: &str) -> Vec<FeatureItem> {
    let mut items = Vec::new();
    let mut rest = body;
    loop {
        rest = rest.trim_start();
        let Some(eq) = rest.find('=') else {
            break;
        };
        let name = &rest[..eq];
        if name.is_empty() || name.contains(char::is_whitespace) {
            break;
        }
        let after = &rest[eq + 1..];
        let (raw, quoted, remaining) = if let Some(inner) = after.strip_prefix('"') {
            match inner.find('"') {
                Some(end) => (&inner[..end], true, &inner[end + 1..]),
                None => (inner, true, ""),
            }
        } else {
            let end = after.find(char::is_whitespace).unwrap_or(after.len());
            (&after[..end], false, &after[end..])
        };
        rest = remaining;

        let item = FeatureKey::from_name(name)
            .and_then(|key| {
                FeatureValue::parse(key.kind(), raw, quoted)
                    .map(|value| FeatureItem::Accepted { key, value })
            })
            .unwrap_or_else(|| FeatureItem::Rejected {
                name: name.to_string(),
            });
        items.push(item);
    }
    items
}

/// Whether the engine wants `time`/`otim`.
///
/// Engines are sent time until they say otherwise; an error reply to `time`
/// before the first confirmation turns it off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeSupport {
    Unconfirmed,
    Confirmed,
    Off,
}

impl TimeSupport {
    #[inline]
    #[must_use]
    pub fn sends_time(self) -> bool {
        !matches!(self, TimeSupport::Off)
    }
}

/// What an engine has agreed to.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub protocol_version: u32,
    pub ping: bool,
    pub setboard: bool,
    pub playother: bool,
    pub san: bool,
    pub usermove: bool,
    pub time: TimeSupport,
    /// Forward draw offers to this engine
    pub draw: bool,
    pub sigint: bool,
    pub sigterm: bool,
    pub reuse: bool,
    pub analyze: bool,
    pub colors: bool,
    pub ics: bool,
    pub name: bool,
    pub pause: bool,
    pub my_name: Option<String>,
    /// Advertised variant names; `None` until the engine sends any
    pub variants: Option<Vec<String>>,
}

impl Capabilities {
    /// Protocol defaults before any `feature` line.
    #[must_use]
    pub fn new(protocol_version: u32, reuse: bool) -> Self {
        Capabilities {
            protocol_version,
            ping: false,
            setboard: false,
            playother: false,
            san: false,
            usermove: false,
            time: TimeSupport::Unconfirmed,
            draw: true,
            sigint: true,
            sigterm: true,
            reuse,
            analyze: true,
            colors: true,
            ics: false,
            name: false,
            pause: false,
            my_name: None,
            variants: None,
        }
    }

    /// Record an accepted feature. `done` is handled by the session.
    pub fn apply(&mut self, key: FeatureKey, value: &FeatureValue) {
        if let FeatureValue::Str(text) = value {
            match key {
                FeatureKey::MyName => self.my_name = Some(text.clone()),
                FeatureKey::Variants => {
                    self.variants = Some(
                        text.split(',')
                            .map(|v| v.trim().to_ascii_lowercase())
                            .filter(|v| !v.is_empty())
                            .collect(),
                    );
                }
                _ => {}
            }
            return;
        }
        let Some(on) = value.as_bool() else {
            return;
        };
        match key {
            FeatureKey::Ping => self.ping = on,
            FeatureKey::SetBoard => self.setboard = on,
            FeatureKey::PlayOther => self.playother = on,
            FeatureKey::San => self.san = on,
            FeatureKey::UserMove => self.usermove = on,
            FeatureKey::Time => {
                self.time = if on {
                    TimeSupport::Confirmed
                } else {
                    TimeSupport::Off
                };
            }
            FeatureKey::Draw => self.draw = on,
            FeatureKey::Sigint => self.sigint = on,
            FeatureKey::Sigterm => self.sigterm = on,
            // an engine can refuse reuse but cannot force it
            FeatureKey::Reuse => self.reuse &= on,
            FeatureKey::Analyze => self.analyze = on,
            FeatureKey::Colors => self.colors = on,
            FeatureKey::Ics => self.ics = on,
            FeatureKey::Name => self.name = on,
            FeatureKey::Pause => self.pause = on,
            FeatureKey::MyName | FeatureKey::Variants | FeatureKey::Done => {}
        }
    }

    /// True when the engine can play `variant` (protocol name).
    ///
    /// Engines that never listed their variants are trusted.
    #[must_use]
    pub fn supports_variant(&self, variant: &str) -> bool {
        match &self.variants {
            None => true,
            Some(list) => list.iter().any(|v| v == variant),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::new(2, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_line() {
        let items = parse_features(r#"ping=1 myname="Fairy-Max 5.0b" frobnicate=3 san=1 done=1"#);
        assert_eq!(
            items,
            vec![
                FeatureItem::Accepted {
                    key: FeatureKey::Ping,
                    value: FeatureValue::Bool(true)
                },
                FeatureItem::Accepted {
                    key: FeatureKey::MyName,
                    value: FeatureValue::Str("Fairy-Max 5.0b".to_string())
                },
                FeatureItem::Rejected {
                    name: "frobnicate".to_string()
                },
                FeatureItem::Accepted {
                    key: FeatureKey::San,
                    value: FeatureValue::Bool(true)
                },
                FeatureItem::Accepted {
                    key: FeatureKey::Done,
                    value: FeatureValue::Int(1)
                },
            ]
        );
        assert_eq!(items[2].reply(), "rejected frobnicate");
        assert_eq!(items[0].reply(), "accepted ping");
    }

    #[test]
    fn test_unknown_quoted_value_is_skipped() {
        let items = parse_features(r#"egt="syzygy,scorpio" usermove=1"#);
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            FeatureItem::Rejected {
                name: "egt".to_string()
            }
        );
        assert!(matches!(
            items[1],
            FeatureItem::Accepted {
                key: FeatureKey::UserMove,
                ..
            }
        ));
    }

    #[test]
    fn test_wrongly_typed_value_is_rejected() {
        let items = parse_features("ping=yes myname=bare");
        assert!(items
            .iter()
            .all(|i| matches!(i, FeatureItem::Rejected { .. })));
    }

    #[test]
    fn test_reuse_can_only_be_disabled() {
        let mut caps = Capabilities::new(2, false);
        caps.apply(FeatureKey::Reuse, &FeatureValue::Bool(true));
        assert!(!caps.reuse);
        let mut caps = Capabilities::new(2, true);
        caps.apply(FeatureKey::Reuse, &FeatureValue::Bool(false));
        assert!(!caps.reuse);
    }

    #[test]
    fn test_variants_and_time() {
        let mut caps = Capabilities::default();
        assert!(caps.supports_variant("xiangqi"));
        caps.apply(
            FeatureKey::Variants,
            &FeatureValue::Str("normal,Crazyhouse, shatranj".to_string()),
        );
        assert!(caps.supports_variant("crazyhouse"));
        assert!(caps.supports_variant("shatranj"));
        assert!(!caps.supports_variant("xiangqi"));

        assert!(caps.time.sends_time());
        caps.apply(FeatureKey::Time, &FeatureValue::Bool(false));
        assert_eq!(caps.time, TimeSupport::Off);
    }
}
