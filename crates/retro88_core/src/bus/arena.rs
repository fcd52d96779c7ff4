use super::{BusError, Mapping};

/// Handle to a storage region inside a [`MemoryArena`].
///
/// Handles are handed out by the arena at construction time and stay valid
/// for the arena's lifetime (regions are never removed).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RegionId(usize);

struct Region {
    name: &'static str,
    data: Box<[u8]>,
    writable: bool,
}

/// Owner of every byte buffer a machine can map into its address space
/// (RAM, ROM images, video planes).
///
/// The arena also carries the bus fault latch: the first failed access since
/// the last `take_fault` is kept, later ones are only logged.
#[derive(Default)]
pub struct MemoryArena {
    regions: Vec<Region>,
    fault: Option<BusError>,
}

impl MemoryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zero-filled writable region.
    pub fn add_ram(&mut self, name: &'static str, size: usize) -> RegionId {
        self.push(name, vec![0; size].into_boxed_slice(), true)
    }

    /// Add a read-only region of `size` bytes filled with 0xFF.
    pub fn add_rom(&mut self, name: &'static str, size: usize) -> RegionId {
        self.push(name, vec![0xFF; size].into_boxed_slice(), false)
    }

    fn push(&mut self, name: &'static str, data: Box<[u8]>, writable: bool) -> RegionId {
        let id = RegionId(self.regions.len());
        self.regions.push(Region {
            name,
            data,
            writable,
        });
        id
    }

    /// Copy an image into a region starting at offset 0, bypassing the
    /// read-only check. Bytes beyond the region size are ignored.
    pub fn load(&mut self, id: RegionId, image: &[u8]) {
        let data = &mut self.regions[id.0].data;
        let len = image.len().min(data.len());
        data[..len].copy_from_slice(&image[..len]);
        if image.len() > len {
            log::warn!(
                "image of {} bytes truncated to {} for region `{}`",
                image.len(),
                len,
                self.regions[id.0].name
            );
        }
    }

    pub fn name(&self, id: RegionId) -> &'static str {
        self.regions[id.0].name
    }

    pub fn region(&self, id: RegionId) -> &[u8] {
        &self.regions[id.0].data
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut [u8] {
        &mut self.regions[id.0].data
    }

    #[inline]
    pub fn read(&self, mapping: Mapping) -> Result<u8, BusError> {
        let region = &self.regions[mapping.region.0];
        region
            .data
            .get(mapping.offset)
            .copied()
            .ok_or(BusError::OutOfRange {
                region: region.name,
                offset: mapping.offset,
            })
    }

    #[inline]
    pub fn write(&mut self, mapping: Mapping, value: u8) -> Result<(), BusError> {
        let region = &mut self.regions[mapping.region.0];
        if !region.writable {
            return Err(BusError::ReadOnly {
                region: region.name,
                offset: mapping.offset,
            });
        }
        let name = region.name;
        match region.data.get_mut(mapping.offset) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BusError::OutOfRange {
                region: name,
                offset: mapping.offset,
            }),
        }
    }

    pub fn raise_fault(&mut self, err: BusError) {
        log::error!("bus fault: {}", err);
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    pub fn take_fault(&mut self) -> Option<BusError> {
        self.fault.take()
    }
}
