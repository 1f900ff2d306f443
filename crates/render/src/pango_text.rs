//! Pango-based text layout for the Cairo backend.
//!
//! Cairo's toy font API keeps internal font caches that grow without bound,
//! so all text goes through Pango layouts. Font descriptions are cached per
//! thread keyed by family, weight, style and pixel size.

use std::cell::RefCell;
use std::collections::HashMap;

use cairo::Context;
use pango::{AttrInt, AttrList, EllipsizeMode, FontDescription, Layout, Style as PangoStyle, Weight as PangoWeight, WrapMode};
use pangocairo::functions::create_layout;
use sensor_panel_types::{Ellipsis, FontSpec, TextAlign};

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
    size_pango: i32, // Absolute size in Pango units (pixels * PANGO_SCALE)
}

impl FontKey {
    fn new(font: &FontSpec) -> Self {
        Self {
            family: font.family.clone(),
            bold: font.bold,
            italic: font.italic,
            size_pango: (font.size.max(1.0) * pango::SCALE as f64) as i32,
        }
    }
}

/// Cache for FontDescription objects to avoid repeated allocations
struct FontDescriptionCache {
    cache: HashMap<FontKey, FontDescription>,
    max_entries: usize,
}

impl FontDescriptionCache {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
            max_entries: 64,
        }
    }

    fn get_or_create(&mut self, font: &FontSpec) -> FontDescription {
        let key = FontKey::new(font);
        if let Some(desc) = self.cache.get(&key) {
            return desc.clone();
        }

        // Evict if full (simple eviction - just clear half)
        if self.cache.len() >= self.max_entries {
            let keys_to_remove: Vec<_> = self
                .cache
                .keys()
                .take(self.max_entries / 2)
                .cloned()
                .collect();
            for k in keys_to_remove {
                self.cache.remove(&k);
            }
        }

        let mut desc = FontDescription::new();
        desc.set_family(&font.family);
        desc.set_weight(if font.bold {
            PangoWeight::Bold
        } else {
            PangoWeight::Normal
        });
        desc.set_style(if font.italic {
            PangoStyle::Italic
        } else {
            PangoStyle::Normal
        });
        desc.set_absolute_size(key.size_pango as f64);

        self.cache.insert(key, desc.clone());
        desc
    }
}

thread_local! {
    static FONT_DESC_CACHE: RefCell<FontDescriptionCache> = RefCell::new(FontDescriptionCache::new());
}

/// Cached font description for a font spec
pub fn font_description(font: &FontSpec) -> FontDescription {
    FONT_DESC_CACHE.with(|cache| cache.borrow_mut().get_or_create(font))
}

/// Clear the font description cache on this thread
pub fn clear_pango_caches() {
    FONT_DESC_CACHE.with(|cache| cache.borrow_mut().cache.clear());
    log::debug!("Pango caches cleared");
}

/// Layout options beyond the font itself
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOptions {
    /// Width in pixels that wrapping, ellipsis and alignment work against
    pub width: Option<f64>,
    pub wrap: bool,
    pub ellipsis: Ellipsis,
    pub align: TextAlign,
}

/// Build a Pango layout for `text` on `cr`
pub fn text_layout(cr: &Context, text: &str, font: &FontSpec, options: LayoutOptions) -> Layout {
    let layout = create_layout(cr);
    layout.set_font_description(Some(&font_description(font)));
    layout.set_text(text);

    if font.underline || font.strikeout {
        let attrs = AttrList::new();
        if font.underline {
            attrs.insert(AttrInt::new_underline(pango::Underline::Single));
        }
        if font.strikeout {
            attrs.insert(AttrInt::new_strikethrough(true));
        }
        layout.set_attributes(Some(&attrs));
    }

    // A width without wrap or ellipsis would make Pango wrap anyway
    let Some(width) = options.width.filter(|w| *w > 0.0) else {
        return layout;
    };
    if options.wrap {
        layout.set_width((width * pango::SCALE as f64) as i32);
        layout.set_wrap(WrapMode::WordChar);
        layout.set_alignment(match options.align {
            TextAlign::Left => pango::Alignment::Left,
            TextAlign::Center => pango::Alignment::Center,
            TextAlign::Right => pango::Alignment::Right,
        });
    } else if options.ellipsis != Ellipsis::None {
        layout.set_width((width * pango::SCALE as f64) as i32);
        layout.set_ellipsize(match options.ellipsis {
            Ellipsis::Middle => EllipsizeMode::Middle,
            _ => EllipsizeMode::End,
        });
    }
    layout
}

/// Whether the layout aligns lines itself; otherwise callers offset the
/// whole block by its measured width
pub fn aligns_internally(options: &LayoutOptions) -> bool {
    options.wrap && options.width.is_some_and(|w| w > 0.0)
}

/// Logical size of a layout in pixels
pub fn layout_size(layout: &Layout) -> (f64, f64) {
    let (width, height) = layout.pixel_size();
    (width as f64, height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_key_ignores_decoration() {
        let plain = FontSpec::new("Sans", 12.0);
        let underlined = FontSpec {
            underline: true,
            ..plain.clone()
        };
        assert_eq!(FontKey::new(&plain), FontKey::new(&underlined));
        assert_ne!(FontKey::new(&plain), FontKey::new(&plain.clone().bold()));
        assert_eq!(FontKey::new(&plain).size_pango, 12 * pango::SCALE);
    }
}
