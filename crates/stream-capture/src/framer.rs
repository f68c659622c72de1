//! JPEG boundary detection over a fixed byte window

/// JPEG start-of-image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Default window size (1 MiB)
pub const DEFAULT_WINDOW_SIZE: usize = 1024 * 1024;

/// Smallest usable window (one SOI + one EOI)
const MIN_WINDOW_SIZE: usize = 4;

/// Splits a delimiter-free stream of concatenated JPEG images.
///
/// Bytes are appended into a fixed window. Each complete SOI..EOI range is
/// copied out and the remaining bytes are shifted to offset 0. The window is
/// never grown: when it fills up without a complete image the caller is
/// expected to [`discard`](Self::discard) it.
pub struct JpegFramer {
    window: Box<[u8]>,
    filled: usize,
    overflows: u64,
}

impl JpegFramer {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: vec![0u8; window_size.max(MIN_WINDOW_SIZE)].into_boxed_slice(),
            filled: 0,
            overflows: 0,
        }
    }

    /// Copy as much of `data` as fits into the window, returning the byte count taken
    pub fn extend(&mut self, data: &[u8]) -> usize {
        let free = self.window.len() - self.filled;
        let n = data.len().min(free);
        self.window[self.filled..self.filled + n].copy_from_slice(&data[..n]);
        self.filled += n;
        n
    }

    /// Extract the next complete image, compacting the window behind it
    pub fn next_image(&mut self) -> Option<Vec<u8>> {
        let data = &self.window[..self.filled];
        let start = find_marker(data, SOI, 0)?;
        let end = find_marker(data, EOI, start + SOI.len())? + EOI.len();

        let image = data[start..end].to_vec();
        self.window.copy_within(end..self.filled, 0);
        self.filled -= end;
        Some(image)
    }

    /// Window is full; no more bytes can be accepted
    pub fn is_full(&self) -> bool {
        self.filled == self.window.len()
    }

    /// Drop everything buffered (oversized or corrupt frame)
    pub fn discard(&mut self) {
        self.filled = 0;
        self.overflows += 1;
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.filled
    }

    /// Number of times the window was discarded
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }
}

impl Default for JpegFramer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

fn find_marker(data: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(2)
        .position(|pair| pair == marker)
        .map(|pos| pos + from)
}
