use binrw::BinRead;
use bitflags::bitflags;

/// A bitfield selecting which brush categories (solid, water, ladder, ...)
/// participate in a trace.
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contents(i32);

bitflags! {
    impl Contents: i32 {
        const EMPTY = 0;
        const SOLID = 0x1;
        const WINDOW = 0x2;
        const AUX = 0x4;
        const GRATE = 0x8;
        const SLIME = 0x10;
        const WATER = 0x20;
        const BLOCK_LOS = 0x40;
        const OPAQUE = 0x80;
        const TEST_FOG_VOLUME = 0x100;
        const TEAM1 = 0x800;
        const TEAM2 = 0x1000;
        const IGNORE_NODRAW_OPAQUE = 0x2000;
        const MOVEABLE = 0x4000;
        const AREAPORTAL = 0x8000;
        const PLAYER_CLIP = 0x10000;
        const MONSTER_CLIP = 0x20000;
        const CURRENT_0 = 0x40000;
        const CURRENT_90 = 0x80000;
        const CURRENT_180 = 0x100000;
        const CURRENT_270 = 0x200000;
        const CURRENT_UP = 0x400000;
        const CURRENT_DOWN = 0x800000;
        const ORIGIN = 0x1000000;
        const MONSTER = 0x2000000;
        const DEBRIS = 0x4000000;
        const DETAIL = 0x8000000;
        const TRANSLUCENT = 0x10000000;
        const LADDER = 0x20000000;
        const HITBOX = 0x40000000;
    }
}

impl Default for Contents {
    fn default() -> Self {
        Contents::EMPTY
    }
}
