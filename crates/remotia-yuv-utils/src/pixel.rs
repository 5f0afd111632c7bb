#[inline]
pub fn clip(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

/// Converts one YUV sample to RGB with fixed point BT.601 full range
/// coefficients.
///
/// The coefficients and the rounding (`+ 128`, then arithmetic shift by 8)
/// match what RDP hosts expect, so the output is bit exact with other clients.
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let c = y as i32;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = clip((256 * c + 403 * e + 128) >> 8);
    let g = clip((256 * c - 48 * d - 120 * e + 128) >> 8);
    let b = clip((256 * c + 475 * d + 128) >> 8);

    (r, g, b)
}

/// Packs a color as a native XRGB32 word, the top byte is left unused.
#[inline]
pub fn rgb32(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn yuv_to_xrgb(y: u8, u: u8, v: u8) -> u32 {
    let (r, g, b) = yuv_to_rgb(y, u, v);
    rgb32(r, g, b)
}

/// Splits an XRGB32 word back into its `(r, g, b)` components.
#[inline]
pub fn xrgb_components(pixel: u32) -> (u8, u8, u8) {
    ((pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8)
}
