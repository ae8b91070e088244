use binrw::BinRead;
use bitflags::bitflags;

/// Per-texinfo surface flags; this core only consults the handful that
/// change ray-test behavior (`NODRAW`/`HINT`/`SKIP` surfaces are skipped,
/// `SKY` surfaces are treated like any other opaque plane since true sky
/// occlusion is a rendering concern).
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfFlags(u32);

bitflags! {
    impl SurfFlags: u32 {
        const LIGHT = 0x1;
        const SKY_2D = 0x2;
        const SKY = 0x4;
        const WARP = 0x8;
        const TRANS = 0x10;
        const NOPORTAL = 0x20;
        const TRIGGER = 0x40;
        const NODRAW = 0x80;
        const HINT = 0x100;
        const SKIP = 0x200;
        const NOLIGHT = 0x400;
        const BUMPLIGHT = 0x800;
        const NOSHADOWS = 0x1000;
        const NODECALS = 0x2000;
        const NOCHOP = 0x4000;
        const HITBOX = 0x8000;
    }
}
