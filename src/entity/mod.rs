use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use compact_str::CompactString;

/// Index into the entity slice handed to a layout pass. Uses u32 like the
/// rest of the engine's ids (a map never holds anywhere near 4 billion entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single weighted company in the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Display name, unique within a layout pass
    pub name: CompactString,
    /// Monetary magnitude (e.g. revenue). Drives area / cell share.
    pub magnitude: f64,
    /// Link target for the rendered block
    pub link: CompactString,
    /// Optional logo image URL
    pub logo: Option<CompactString>,
}

impl Entity {
    pub fn new(name: &str, magnitude: f64) -> Self {
        Self {
            name: CompactString::new(name),
            magnitude,
            link: CompactString::default(),
            logo: None,
        }
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = CompactString::new(link);
        self
    }

    pub fn with_logo(mut self, logo: &str) -> Self {
        self.logo = Some(CompactString::new(logo));
        self
    }

    /// Magnitude as seen by the engines: negative and non-finite values count as zero.
    pub fn weight(&self) -> f64 {
        if self.magnitude.is_finite() {
            self.magnitude.max(0.0)
        } else {
            0.0
        }
    }
}

/// Why an entity was dropped at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NegativeMagnitude,
    NonFiniteMagnitude,
    Duplicate,
}

/// Result of [`sanitize`].
#[derive(Debug, Default)]
pub struct Sanitized {
    pub entities: Vec<Entity>,
    pub rejected: Vec<(Entity, RejectReason)>,
}

/// Boundary policy for entity lists coming from the data collaborator.
///
/// Negative or non-finite magnitudes are rejected rather than clamped, and
/// duplicates by (name, magnitude) are dropped with the first occurrence kept.
/// Zero magnitudes are legal and pass through.
pub fn sanitize(raw: Vec<Entity>) -> Sanitized {
    let mut out = Sanitized {
        entities: Vec::with_capacity(raw.len()),
        rejected: Vec::new(),
    };
    let mut seen: HashSet<(CompactString, u64)> = HashSet::with_capacity(raw.len());

    for entity in raw {
        let reason = if !entity.magnitude.is_finite() {
            Some(RejectReason::NonFiniteMagnitude)
        } else if entity.magnitude < 0.0 {
            Some(RejectReason::NegativeMagnitude)
        } else if !seen.insert((entity.name.clone(), magnitude_key(entity.magnitude))) {
            Some(RejectReason::Duplicate)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                tracing::warn!(
                    "Rejecting entity '{}' (magnitude={}): {:?}",
                    entity.name,
                    entity.magnitude,
                    reason
                );
                out.rejected.push((entity, reason));
            }
            None => out.entities.push(entity),
        }
    }

    if !out.rejected.is_empty() {
        tracing::info!(
            "Sanitized entity list: kept {}, rejected {}",
            out.entities.len(),
            out.rejected.len()
        );
    }
    out
}

/// Stable magnitude-descending order. Ties keep input order (visual priority).
pub fn descending_order(entities: &[Entity]) -> Vec<EntityId> {
    let mut order: Vec<EntityId> = (0..entities.len() as u32).map(EntityId).collect();
    // sort_by is stable
    order.sort_by(|a, b| {
        entities[b.index()]
            .weight()
            .total_cmp(&entities[a.index()].weight())
    });
    order
}

/// Sum of engine weights.
pub fn total_weight(entities: &[Entity]) -> f64 {
    entities.iter().map(Entity::weight).sum()
}

/// Order-sensitive hash of names and magnitudes, usable as a layout cache key.
pub fn fingerprint(entities: &[Entity]) -> u64 {
    let mut h = DefaultHasher::new();
    entities.len().hash(&mut h);
    for e in entities {
        e.name.hash(&mut h);
        magnitude_key(e.magnitude).hash(&mut h);
    }
    h.finish()
}

// -0.0 and 0.0 are the same magnitude
fn magnitude_key(m: f64) -> u64 {
    if m == 0.0 {
        0
    } else {
        m.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_negative_and_non_finite() {
        let raw = vec![
            Entity::new("ok", 10.0),
            Entity::new("neg", -1.0),
            Entity::new("nan", f64::NAN),
            Entity::new("inf", f64::INFINITY),
            Entity::new("zero", 0.0),
        ];
        let s = sanitize(raw);
        let names: Vec<&str> = s.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ok", "zero"]);
        assert_eq!(s.rejected.len(), 3);
        assert_eq!(s.rejected[0].1, RejectReason::NegativeMagnitude);
        assert_eq!(s.rejected[1].1, RejectReason::NonFiniteMagnitude);
    }

    #[test]
    fn sanitize_drops_duplicates_by_name_and_magnitude() {
        let raw = vec![
            Entity::new("Acme", 5.0).with_link("https://a.example"),
            Entity::new("Acme", 5.0).with_link("https://b.example"),
            Entity::new("Acme", 6.0),
        ];
        let s = sanitize(raw);
        assert_eq!(s.entities.len(), 2);
        assert_eq!(s.entities[0].link, "https://a.example");
        assert_eq!(s.rejected[0].1, RejectReason::Duplicate);
    }

    #[test]
    fn descending_order_is_stable_on_ties() {
        let entities = vec![
            Entity::new("b", 50.0),
            Entity::new("a", 100.0),
            Entity::new("c", 50.0),
        ];
        let order = descending_order(&entities);
        assert_eq!(order, vec![EntityId(1), EntityId(0), EntityId(2)]);
    }

    #[test]
    fn weight_clamps_invalid_magnitudes() {
        assert_eq!(Entity::new("x", -3.0).weight(), 0.0);
        assert_eq!(Entity::new("x", f64::NAN).weight(), 0.0);
        assert_eq!(Entity::new("x", 2.5).weight(), 2.5);
    }

    #[test]
    fn fingerprint_tracks_content_and_order() {
        let a = vec![Entity::new("a", 1.0), Entity::new("b", 2.0)];
        let b = vec![Entity::new("b", 2.0), Entity::new("a", 1.0)];
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&b));
        let mut c = a.clone();
        c[0].magnitude = 1.5;
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
