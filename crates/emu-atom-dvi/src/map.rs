//! Host addresses the video and sound hardware respond to.

/// Video RAM shared by the VDG, VGA80 and teletext.
pub const FB_ADDR: u16 = 0x8000;
pub const FB_LEN: usize = 0x2000;

/// Atom 8255 port A: VDG mode in bits 7–4.
pub const ATOM_PIA_A: u16 = 0xB000;
/// Atom 8255 port C: CSS in bit 3.
pub const ATOM_PIA_C: u16 = 0xB002;
/// Dragon PIA 1 port B: VDG mode, CSS and INT/EXT.
pub const DRAGON_PIA_B: u16 = 0xFF22;

/// SID register block.
pub const SID_BASE: u16 = 0xBDC0;
/// Registers the host may write.
pub const SID_WRITABLE: usize = 0x19;
/// Paddle, OSC3 and ENV3 registers the host reads back.
pub const SID_READABLE: usize = 4;
pub const SID_POTX: u16 = SID_BASE + 0x19;
pub const SID_POTY: u16 = SID_BASE + 0x1A;
pub const SID_OSC3: u16 = SID_BASE + 0x1B;
pub const SID_ENV3: u16 = SID_BASE + 0x1C;

/// VGA80 control block.
pub const COL80_BASE: u16 = 0xBDE0;
pub const COL80_FG: u16 = 0xBDE4;
pub const COL80_BG: u16 = 0xBDE5;
pub const COL80_STAT: u16 = 0xBDE7;
pub const COL80_LEN: usize = 16;
/// `COL80_BASE`: 80-column display on.
pub const COL80_ON: u8 = 0x80;
/// `COL80_FG`: attribute plane follows the characters.
pub const COL80_ATTR: u8 = 0x08;

/// 6845 address and data ports.
pub const TELETEXT_CRTA: u16 = 0xBDF0;
pub const TELETEXT_CRTB: u16 = 0xBDF1;
/// Teletext flags: bit 0 debug, bit 1 reveal, bit 7 enable.
pub const TELETEXT_REG_FLAGS: u16 = 0xBDF2;
pub const TELETEXT_ENABLE: u8 = 0x80;
/// Base of the 1K teletext page.
pub const TELETEXT_PAGE: u16 = 0x8400;
