/// Packed 24-bit LED color, laid out as green:[16..24), red:[8..16),
/// blue:[0..8). The hardware consumes this word verbatim, so the
/// non-standard channel order must be preserved.
pub type PackedColor = u32;

pub fn pack(green: u8, red: u8, blue: u8) -> PackedColor {
    (u32::from(green) << 16) | (u32::from(red) << 8) | u32::from(blue)
}

/// Splits a packed color back into its (green, red, blue) intensities.
pub fn channels(color: PackedColor) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}
