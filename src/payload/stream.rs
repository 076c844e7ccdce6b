//! Back-pressure-aware byte queue backing one logical stream.
//!
//! The receiver task pushes whole frame chunks with [`PayloadStream::give_buffer`];
//! a consumer task drains them sequentially with [`PayloadStream::read`],
//! suspending while no chunk is queued. Chunks come back in exactly the
//! order they were given. Once the consumer has read the stream's declared
//! content length, further reads return `0` without suspending, even if
//! extra chunks remain queued.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use tokio::sync::Semaphore;

#[derive(Default)]
struct StreamState {
    queue: VecDeque<Vec<u8>>,
    active: Vec<u8>,
    active_offset: usize,
    producer_length: usize,
    consumer_position: usize,
    content_length: Option<usize>,
    end: bool,
}

impl StreamState {
    fn has_active_bytes(&self) -> bool { self.active_offset < self.active.len() }

    fn note_consumed(&mut self, count: usize) {
        self.consumer_position += count;
        if self.active_offset >= self.active.len() {
            self.active = Vec::new();
            self.active_offset = 0;
        }
        if let Some(length) = self.content_length {
            if self.consumer_position >= length {
                self.end = true;
            }
        }
    }
}

/// Ordered chunk queue with single-producer/single-consumer semantics.
///
/// The queue itself is mutex-guarded because the producer (receiver loop)
/// and the consumer (a body-reading task) run on different tasks; the
/// counting semaphore carries one permit per queued chunk so readers can
/// suspend without polling.
pub struct PayloadStream {
    state: Mutex<StreamState>,
    data_available: Semaphore,
}

impl Default for PayloadStream {
    fn default() -> Self { Self::new() }
}

impl PayloadStream {
    /// Create an empty stream with no declared content length.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StreamState::default()),
            data_available: Semaphore::new(0),
        }
    }

    /// Declare the total content length consumers should expect.
    ///
    /// The length usually arrives after the stream was created, once the
    /// control payload announcing the stream has been assembled.
    pub fn set_content_length(&self, length: usize) {
        self.state.lock().expect("stream state lock").content_length = Some(length);
    }

    /// Declared content length, if the announcing control payload carried one.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.state.lock().expect("stream state lock").content_length
    }

    /// Total bytes handed to the queue by the producer so far.
    #[must_use]
    pub fn producer_length(&self) -> usize {
        self.state.lock().expect("stream state lock").producer_length
    }

    /// Enqueue one chunk. Never blocks.
    pub fn give_buffer(&self, chunk: Vec<u8>) {
        {
            let mut state = self.state.lock().expect("stream state lock");
            state.producer_length += chunk.len();
            state.queue.push_back(chunk);
        }
        self.data_available.add_permits(1);
    }

    /// Enqueue a zero-length terminal chunk to unblock a final pending read.
    pub fn done_producing(&self) { self.give_buffer(Vec::new()); }

    /// Mark the stream finished and wake any suspended reader.
    ///
    /// Used when the stream is cancelled or its connection drops; subsequent
    /// reads return `0` immediately.
    pub fn close(&self) {
        self.state.lock().expect("stream state lock").end = true;
        self.data_available.close();
    }

    /// Copy queued bytes into `buffer`, suspending until a chunk is available.
    ///
    /// Returns the number of bytes copied, or `0` once the declared content
    /// length has been consumed or the stream was closed. A single call
    /// never crosses a chunk boundary; callers read in a loop.
    pub async fn read(&self, buffer: &mut [u8]) -> usize {
        let needs_chunk = {
            let state = self.state.lock().expect("stream state lock");
            if state.end {
                return 0;
            }
            !state.has_active_bytes()
        };

        if needs_chunk {
            match self.data_available.acquire().await {
                Ok(permit) => permit.forget(),
                // closed while waiting: the stream was cancelled
                Err(_) => return 0,
            }
            let mut state = self.state.lock().expect("stream state lock");
            if let Some(chunk) = state.queue.pop_front() {
                state.active = chunk;
                state.active_offset = 0;
            }
        }

        let mut state = self.state.lock().expect("stream state lock");
        if state.end {
            return 0;
        }
        let available = (state.active.len() - state.active_offset).min(buffer.len());
        let start = state.active_offset;
        buffer[..available].copy_from_slice(&state.active[start..start + available]);
        state.active_offset += available;
        state.note_consumed(available);

        available
    }

    /// Drain the stream to completion and return the assembled bytes.
    ///
    /// With a declared content length the result buffer is preallocated and
    /// filled until that length is reached; without one, chunks are drained
    /// until the producer's terminal chunk arrives.
    pub async fn read_until_end(&self) -> Vec<u8> {
        let expected = self.content_length();

        match expected {
            Some(length) => {
                let mut result = vec![0_u8; length];
                let mut filled = 0;
                while filled < length {
                    let count = self.read(&mut result[filled..]).await;
                    if count == 0 {
                        break;
                    }
                    filled += count;
                }
                result.truncate(filled);
                result
            }
            None => {
                let mut result = Vec::new();
                let mut scratch = [0_u8; 4096];
                loop {
                    let count = self.read(&mut scratch).await;
                    if count == 0 {
                        break;
                    }
                    result.extend_from_slice(&scratch[..count]);
                }
                result
            }
        }
    }
}

impl std::fmt::Debug for PayloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("stream state lock");
        f.debug_struct("PayloadStream")
            .field("queued_chunks", &state.queue.len())
            .field("producer_length", &state.producer_length)
            .field("consumer_position", &state.consumer_position)
            .field("content_length", &state.content_length)
            .field("end", &state.end)
            .finish()
    }
}
