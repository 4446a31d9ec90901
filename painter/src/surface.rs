use engine::Bitmap;
use geometry::Rect;

/// The drawing primitives a host's canvas widget must provide. Kept
/// minimal and GUI-toolkit-agnostic, generalizing the teacher's direct
/// `gtk::Snapshot` calls (`append_color`/`append_texture`/
/// `append_outset_shadow`) into a trait any backend (GTK, a software
/// framebuffer, a test double) can implement.
pub trait Surface {
    /// Fills `rect` (viewport pixels) with a flat RGBA color.
    fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]);

    /// Blits `bitmap` stretched to fill `dest` (viewport pixels). Used both
    /// for an exact-resolution tile (`dest` sized to match the bitmap 1:1)
    /// and a fuzzy-zoom stand-in (`dest` sized to the current zoom while
    /// the bitmap itself is stale).
    fn draw_bitmap(&mut self, dest: Rect, bitmap: &Bitmap);

    /// A soft drop-shadow just outside `page_rect`.
    fn draw_shadow(&mut self, page_rect: Rect);

    /// A "rendering…" placeholder for a tile with nothing cached to show.
    fn draw_placeholder(&mut self, rect: Rect);
}
