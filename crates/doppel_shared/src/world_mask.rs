//! # World Masks & Collision Filters
//!
//! Every shape in the scene belongs to one or more categories (`group`) and
//! collides with one or more categories (`mask`). Two shapes interact only
//! when each one's group is accepted by the other's mask.
//!
//! ```text
//!   bit:    4        3        2        1        0
//!        STATIC   REMOTE   PLAYER   DITHER   BLOOM
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Category bits used for visibility and collision filtering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct WorldMask(u32);

impl WorldMask {
    /// No category.
    pub const NONE: Self = Self(0);
    /// Bloom-lit world.
    pub const BLOOM: Self = Self(1 << 0);
    /// Dithered world.
    pub const DITHER: Self = Self(1 << 1);
    /// Present in both worlds.
    pub const BOTH: Self = Self(Self::BLOOM.0 | Self::DITHER.0);
    /// The player capsule.
    pub const PLAYER: Self = Self(1 << 2);
    /// The throwable remote.
    pub const REMOTE: Self = Self(1 << 3);
    /// Static level geometry and triggers.
    pub const STATIC: Self = Self(1 << 4);

    /// Creates a mask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True if any bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// True if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combines two masks.
    #[inline]
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for WorldMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for WorldMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for WorldMask {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for WorldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(WorldMask, &str); 5] = [
            (WorldMask::BLOOM, "BLOOM"),
            (WorldMask::DITHER, "DITHER"),
            (WorldMask::PLAYER, "PLAYER"),
            (WorldMask::REMOTE, "REMOTE"),
            (WorldMask::STATIC, "STATIC"),
        ];

        if self.is_empty() {
            return f.write_str("WorldMask(NONE)");
        }
        f.write_str("WorldMask(")?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.intersects(bit) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

// =============================================================================
// ACTIVE WORLD
// =============================================================================

/// Which of the two parallel worlds currently governs visibility and collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveWorld {
    /// Bloom-lit world.
    Bloom,
    /// Dithered world. The game starts here.
    #[default]
    Dither,
}

impl ActiveWorld {
    /// The mask bit for this world.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> WorldMask {
        match self {
            Self::Bloom => WorldMask::BLOOM,
            Self::Dither => WorldMask::DITHER,
        }
    }

    /// The other world.
    #[inline]
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Bloom => Self::Dither,
            Self::Dither => Self::Bloom,
        }
    }

    /// Shorthand for `self == ActiveWorld::Bloom`.
    #[inline]
    #[must_use]
    pub const fn is_bloom(self) -> bool {
        matches!(self, Self::Bloom)
    }
}

// =============================================================================
// COLLISION FILTER
// =============================================================================

/// A `(group, mask)` pair carried by every physics shape and query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Categories this shape belongs to.
    pub group: WorldMask,
    /// Categories this shape collides with.
    pub mask: WorldMask,
}

impl CollisionFilter {
    /// Creates a filter from a group and a mask.
    #[inline]
    #[must_use]
    pub const fn new(group: WorldMask, mask: WorldMask) -> Self {
        Self { group, mask }
    }

    /// Bidirectional test: both sides must accept each other.
    #[inline]
    #[must_use]
    pub const fn interacts(&self, other: &Self) -> bool {
        self.group.intersects(other.mask) && other.group.intersects(self.mask)
    }

    /// Default for static level geometry with no world affinity.
    #[inline]
    #[must_use]
    pub const fn static_default() -> Self {
        Self::new(WorldMask::BOTH, WorldMask::BOTH)
    }

    /// Geometry or pickup that lives in `world` and catches the thrown remote.
    #[inline]
    #[must_use]
    pub const fn world_geometry(world: WorldMask) -> Self {
        Self::new(world, world.with(WorldMask::REMOTE))
    }

    /// The player capsule while `world` is active.
    #[inline]
    #[must_use]
    pub const fn character(world: ActiveWorld) -> Self {
        Self::new(world.mask(), world.mask().with(WorldMask::STATIC))
    }

    /// The remote while parked or held: no world geometry catches it.
    #[inline]
    #[must_use]
    pub const fn remote_at_rest() -> Self {
        Self::new(WorldMask::REMOTE, WorldMask::STATIC)
    }

    /// The remote after being thrown into `world`.
    #[inline]
    #[must_use]
    pub const fn remote_thrown(world: ActiveWorld) -> Self {
        Self::new(WorldMask::REMOTE, WorldMask::STATIC.with(world.mask()))
    }

    /// The pressure-plate trigger volume.
    #[inline]
    #[must_use]
    pub const fn pressure_plate() -> Self {
        Self::new(WorldMask::BOTH, WorldMask::REMOTE.with(WorldMask::STATIC))
    }

    /// The pick ray cast from the camera while `world` is active.
    #[inline]
    #[must_use]
    pub const fn pick_ray(world: ActiveWorld) -> Self {
        Self::new(
            world.mask(),
            world.mask().with(WorldMask::STATIC).with(WorldMask::REMOTE),
        )
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::static_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_is_union_of_worlds() {
        assert_eq!(WorldMask::BOTH, WorldMask::BLOOM | WorldMask::DITHER);
        assert_eq!(WorldMask::BOTH.raw(), 3);
        assert_eq!(WorldMask::STATIC.raw(), 16);
    }

    #[test]
    fn test_filter_is_bidirectional() {
        let a = CollisionFilter::new(WorldMask::BLOOM, WorldMask::BOTH);
        let b = CollisionFilter::new(WorldMask::DITHER, WorldMask::DITHER);
        // b accepts nothing a belongs to
        assert!(!a.interacts(&b));
        assert!(!b.interacts(&a));

        let c = CollisionFilter::new(WorldMask::DITHER, WorldMask::BLOOM);
        assert!(a.interacts(&c));
        assert!(c.interacts(&a));
    }

    #[test]
    fn test_character_ignores_other_world() {
        let bloom_floor = CollisionFilter::world_geometry(WorldMask::BLOOM);
        let dither_floor = CollisionFilter::world_geometry(WorldMask::DITHER);
        let walls = CollisionFilter::static_default();

        let player = CollisionFilter::character(ActiveWorld::Dither);
        assert!(player.interacts(&dither_floor));
        assert!(player.interacts(&walls));
        assert!(!player.interacts(&bloom_floor));

        let player = CollisionFilter::character(ActiveWorld::Bloom);
        assert!(player.interacts(&bloom_floor));
        assert!(!player.interacts(&dither_floor));
    }

    #[test]
    fn test_pressure_plate_sees_remote_not_player() {
        let plate = CollisionFilter::pressure_plate();
        assert!(plate.interacts(&CollisionFilter::remote_thrown(ActiveWorld::Bloom)));
        assert!(plate.interacts(&CollisionFilter::remote_thrown(ActiveWorld::Dither)));
        assert!(!plate.interacts(&CollisionFilter::character(ActiveWorld::Bloom)));
        assert!(!plate.interacts(&CollisionFilter::character(ActiveWorld::Dither)));
    }

    #[test]
    fn test_thrown_remote_lands_on_active_world_only() {
        let remote = CollisionFilter::remote_thrown(ActiveWorld::Bloom);
        assert!(remote.interacts(&CollisionFilter::world_geometry(WorldMask::BLOOM)));
        assert!(remote.interacts(&CollisionFilter::world_geometry(WorldMask::BOTH)));
        assert!(!remote.interacts(&CollisionFilter::world_geometry(WorldMask::DITHER)));
        // Bounding walls don't catch the remote
        assert!(!remote.interacts(&CollisionFilter::static_default()));
    }

    #[test]
    fn test_parked_remote_touches_no_world() {
        let remote = CollisionFilter::remote_at_rest();
        assert!(!remote.interacts(&CollisionFilter::world_geometry(WorldMask::BOTH)));
        assert!(!remote.interacts(&CollisionFilter::character(ActiveWorld::Dither)));
    }

    #[test]
    fn test_pick_ray_hits_pickups_in_active_world() {
        let ray = CollisionFilter::pick_ray(ActiveWorld::Bloom);
        assert!(ray.interacts(&CollisionFilter::world_geometry(WorldMask::BLOOM)));
        assert!(ray.interacts(&CollisionFilter::remote_thrown(ActiveWorld::Bloom)));
        assert!(!ray.interacts(&CollisionFilter::world_geometry(WorldMask::DITHER)));
    }

    #[test]
    fn test_active_world_toggle() {
        assert_eq!(ActiveWorld::default(), ActiveWorld::Dither);
        assert_eq!(ActiveWorld::Dither.toggled(), ActiveWorld::Bloom);
        assert_eq!(ActiveWorld::Bloom.toggled().toggled(), ActiveWorld::Bloom);
        assert!(ActiveWorld::Bloom.is_bloom());
    }

    #[test]
    fn test_filter_reads_from_toml() {
        #[derive(Deserialize)]
        struct Section {
            world: ActiveWorld,
            filter: CollisionFilter,
        }

        let section: Section =
            toml::from_str("world = \"bloom\"\n[filter]\ngroup = 8\nmask = 16\n").unwrap();
        assert_eq!(section.world, ActiveWorld::Bloom);
        assert_eq!(section.filter, CollisionFilter::remote_at_rest());
    }

    #[test]
    fn test_debug_lists_bits() {
        let text = format!("{:?}", WorldMask::REMOTE | WorldMask::STATIC);
        assert_eq!(text, "WorldMask(REMOTE | STATIC)");
        assert_eq!(format!("{:?}", WorldMask::NONE), "WorldMask(NONE)");
    }
}
