use chisel_blob::{BlobError, BlobRef, BlobVersion, SideSampling, VoxelBlob};
use chisel_blocks::{AIR, StateId, StateTable};

/// One chiseled block: the published blob plus metadata derived from it.
///
/// A private working copy exists only while a batch has uncommitted writes;
/// readers see it, the published reference stays untouched until
/// [`ChiseledBlock::publish`].
#[derive(Clone, Debug)]
pub struct ChiseledBlock {
    blob: BlobRef,
    working: Option<VoxelBlob>,
    pub primary_state: StateId,
    pub side_flags: u8,
    /// 0..=15.
    pub light_level: u8,
    pub opacity: f32,
}

impl ChiseledBlock {
    pub fn new(blob: BlobRef, table: &dyn StateTable, sampling: SideSampling) -> Self {
        let mut c = Self {
            blob,
            working: None,
            primary_state: AIR,
            side_flags: 0,
            light_level: 0,
            opacity: 0.0,
        };
        c.refresh(table, sampling);
        c
    }

    pub fn empty(side: usize) -> Result<Self, BlobError> {
        Ok(Self {
            blob: BlobRef::empty(side)?,
            working: None,
            primary_state: AIR,
            side_flags: 0,
            light_level: 0,
            opacity: 0.0,
        })
    }

    #[inline]
    pub fn blob(&self) -> &BlobRef {
        &self.blob
    }

    pub fn has_pending(&self) -> bool {
        self.working.is_some()
    }

    /// Current state of a local cell, including uncommitted writes.
    pub fn state(&self, x: usize, y: usize, z: usize) -> Result<StateId, BlobError> {
        match &self.working {
            Some(w) => w.get(x, y, z),
            None => self.blob.blob().get(x, y, z),
        }
    }

    pub(crate) fn write(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        state: StateId,
    ) -> Result<(), BlobError> {
        let blob = &self.blob;
        self.working
            .get_or_insert_with(|| (*blob.blob()).clone())
            .set(x, y, z, state)
    }

    /// Swaps the working copy in as the new published reference and
    /// recomputes metadata. Returns false when the result is all air.
    ///
    /// Ids that the legacy layout cannot hold are published paletted. On
    /// any other encoding error the working copy is kept.
    pub(crate) fn publish(
        &mut self,
        version: BlobVersion,
        table: &dyn StateTable,
        sampling: SideSampling,
    ) -> Result<bool, BlobError> {
        if let Some(w) = self.working.take() {
            let version = match version {
                BlobVersion::Legacy if w.max_state() > 0x0f => {
                    log::warn!(
                        target: "area",
                        "state {} does not fit the legacy layout, publishing paletted",
                        w.max_state()
                    );
                    BlobVersion::Paletted
                }
                v => v,
            };
            match BlobRef::encode(w, version) {
                Ok(blob) => self.blob = blob,
                Err((e, w)) => {
                    self.working = Some(w);
                    return Err(e);
                }
            }
            self.refresh(table, sampling);
        }
        Ok(!self.blob.blob().is_empty())
    }

    fn refresh(&mut self, table: &dyn StateTable, sampling: SideSampling) {
        let blob = self.blob.blob();
        let stats = blob.stats(table);
        self.primary_state = stats.most_common_state;
        self.light_level = stats.light_level();
        self.opacity = stats.opacity;
        self.side_flags = blob.side_flags(table, sampling);
    }
}
