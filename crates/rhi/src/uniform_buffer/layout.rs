use math::{aligned_offset, Std140};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadField {
    pub name: &'static str,
    pub offset: u64,
    pub size: u64,
    pub alignment: u64,
}

impl PayloadField {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Byte layout of a uniform block, with every offset computed once up front.
///
/// Each field starts at the end of the previous one, rounded up to the field's
/// own alignment. The block size is rounded up to the largest field alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadLayout {
    fields: Vec<PayloadField>,
    size: u64,
}

impl PayloadLayout {
    pub fn builder() -> PayloadLayoutBuilder {
        PayloadLayoutBuilder::default()
    }

    pub fn fields(&self) -> &[PayloadField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&PayloadField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn offset_of(&self, name: &str) -> Option<u64> {
        self.field(name).map(|field| field.offset)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PayloadLayoutBuilder {
    fields: Vec<PayloadField>,
    cursor: u64,
    max_alignment: u64,
}

impl PayloadLayoutBuilder {
    /// # Panics
    ///
    /// Panics if `size` is zero or `alignment` is not a power of two.
    pub fn field(mut self, name: &'static str, size: u64, alignment: u64) -> Self {
        assert!(size > 0, "field `{name}` has zero size");
        let offset = aligned_offset(self.cursor, alignment);
        self.fields.push(PayloadField {
            name,
            offset,
            size,
            alignment,
        });
        self.cursor = offset + size;
        self.max_alignment = self.max_alignment.max(alignment);
        self
    }

    pub fn std140<T: Std140>(self, name: &'static str) -> Self {
        self.field(name, T::SIZE, T::ALIGNMENT)
    }

    pub fn build(self) -> PayloadLayout {
        let size = if self.fields.is_empty() {
            0
        } else {
            aligned_offset(self.cursor, self.max_alignment)
        };
        PayloadLayout {
            fields: self.fields,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use math::prelude::*;

    use super::*;

    #[test]
    fn three_matrices_are_packed_back_to_back() {
        let layout = PayloadLayout::builder()
            .field("model", 64, 16)
            .field("view", 64, 16)
            .field("projection", 64, 16)
            .build();

        let offsets: Vec<u64> = layout.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128]);
        assert!(layout.size() >= 192);
        assert_eq!(layout.offset_of("projection"), Some(128));
        assert_eq!(layout.offset_of("normal"), None);
    }

    #[test]
    fn fields_use_their_own_alignment() {
        let layout = PayloadLayout::builder()
            .std140::<f32>("time")
            .std140::<Vec4>("tint")
            .std140::<Vec3>("light_dir")
            .std140::<f32>("intensity")
            .std140::<Vec2>("resolution")
            .build();

        let offsets: Vec<u64> = layout.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 44, 48]);
        assert_eq!(layout.size(), 64);

        for pair in layout.fields().windows(2) {
            assert!(pair[1].offset >= pair[0].end());
        }
        for field in layout.fields() {
            assert_eq!(field.offset % field.alignment, 0);
        }
    }

    #[test]
    fn empty_layout_has_no_size() {
        let layout = PayloadLayout::builder().build();
        assert!(layout.is_empty());
        assert_eq!(layout.size(), 0);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn bad_alignment_panics() {
        PayloadLayout::builder().field("odd", 4, 3);
    }

    #[test]
    #[should_panic(expected = "zero size")]
    fn zero_sized_field_panics() {
        PayloadLayout::builder().field("nothing", 0, 4);
    }
}
