//! Line-buffer pool between the display driver and the render worker.
//!
//! The driver asks for line `n` and is immediately handed slot `n % N`,
//! rendered earlier. The request goes onto a small queue; the worker pops
//! it and renders line `n + N - 1` into slot `(n + N - 1) % N`, which is
//! never the slot being shown. The frame height must be a multiple of `N`
//! for this to hold across the wrap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, Thread};

use emu_core::{Observable, Pixel, Value};
use log::info;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use shadow_bus::ShadowBus;

use crate::video::VideoPipeline;

/// Line on which the worker drops the vertical sync line.
pub const VSYNC_OFF: usize = 0;

/// A request from the display driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRequest {
    /// Line about to be shown.
    Line(usize),
    /// Vertical blanking: nothing to render.
    Blank,
}

/// The vertical sync output pin.
pub trait SyncOutput {
    fn set_vsync(&mut self, active: bool);
}

/// Sync output for boards without the pin.
pub struct NoSync;

impl SyncOutput for NoSync {
    fn set_vsync(&mut self, _active: bool) {}
}

/// N line buffers of `width` pixels.
pub struct LinePool {
    slots: Box<[Box<[AtomicU8]>]>,
}

impl LinePool {
    /// # Panics
    ///
    /// Panics if `count` is outside 2..=4.
    #[must_use]
    pub fn new(count: usize, width: usize) -> Self {
        assert!(
            (2..=4).contains(&count),
            "line pool size {count} is outside 2..=4"
        );
        let slots = (0..count)
            .map(|_| (0..width).map(|_| AtomicU8::new(0)).collect())
            .collect();
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot that holds `line`.
    #[must_use]
    pub fn slot(&self, line: usize) -> LineSlot<'_> {
        LineSlot {
            index: line % self.slots.len(),
            pixels: &self.slots[line % self.slots.len()],
        }
    }

    fn publish(&self, line: usize, pixels: &[Pixel]) {
        for (cell, &pixel) in self.slots[line % self.slots.len()].iter().zip(pixels) {
            cell.store(pixel, Ordering::Relaxed);
        }
    }
}

/// A view of one line buffer.
pub struct LineSlot<'a> {
    index: usize,
    pixels: &'a [AtomicU8],
}

impl LineSlot<'_> {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn pixel(&self, x: usize) -> Pixel {
        self.pixels[x].load(Ordering::Relaxed)
    }

    /// Copy the line into `out`, as the scan-out DMA would.
    pub fn copy_to(&self, out: &mut [Pixel]) {
        for (pixel, cell) in out.iter_mut().zip(self.pixels) {
            *pixel = cell.load(Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Pixel> {
        self.pixels.iter().map(|cell| cell.load(Ordering::Relaxed)).collect()
    }
}

/// Build a pool and the two ends of its request queue.
#[must_use]
pub fn line_pipeline(
    count: usize,
    width: usize,
    frame_height: usize,
    vsync_on: usize,
    bus: Arc<ShadowBus>,
    video: VideoPipeline,
) -> (LineRequester, RenderWorker) {
    let pool = Arc::new(LinePool::new(count, width));
    let (producer, consumer) = HeapRb::<LineRequest>::new(count).split();
    info!("line pool: {count} buffers of {width} pixels, {frame_height}-line frame");
    let requester = LineRequester {
        producer,
        pool: Arc::clone(&pool),
        worker: None,
        dropped: 0,
    };
    let worker = RenderWorker {
        consumer,
        pool,
        video,
        bus,
        sync: Box::new(NoSync),
        scratch: vec![0; width],
        frame_height,
        vsync_on,
        rendered: 0,
    };
    (requester, worker)
}

/// The display driver's end: asks for lines, reads back slots.
pub struct LineRequester {
    producer: HeapProd<LineRequest>,
    pool: Arc<LinePool>,
    worker: Option<Thread>,
    dropped: u64,
}

impl LineRequester {
    /// Wake `thread` after every request.
    pub fn set_worker(&mut self, thread: Thread) {
        self.worker = Some(thread);
    }

    /// Request `line` and return the slot to display for it.
    ///
    /// A full queue drops the request; the slot is returned regardless.
    pub fn render_line(&mut self, line: usize) -> LineSlot<'_> {
        self.request(LineRequest::Line(line));
        self.pool.slot(line)
    }

    /// Announce a blanking line.
    pub fn vertical_sync(&mut self) {
        self.request(LineRequest::Blank);
    }

    /// Requests dropped because the worker fell behind.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<LinePool> {
        &self.pool
    }

    fn request(&mut self, request: LineRequest) {
        if self.producer.try_push(request).is_err() {
            self.dropped += 1;
        }
        if let Some(worker) = &self.worker {
            worker.unpark();
        }
    }
}

/// Renders requested lines into the pool.
pub struct RenderWorker {
    consumer: HeapCons<LineRequest>,
    pool: Arc<LinePool>,
    video: VideoPipeline,
    bus: Arc<ShadowBus>,
    sync: Box<dyn SyncOutput + Send>,
    scratch: Vec<Pixel>,
    frame_height: usize,
    vsync_on: usize,
    rendered: u64,
}

impl RenderWorker {
    pub fn set_sync_output(&mut self, sync: Box<dyn SyncOutput + Send>) {
        self.sync = sync;
    }

    #[must_use]
    pub fn video(&self) -> &VideoPipeline {
        &self.video
    }

    /// Line rendered in response to a request for `line`.
    #[must_use]
    pub fn line_ahead(&self, line: usize) -> usize {
        (line + self.pool.len() - 1) % self.frame_height
    }

    /// Handle one queued request, if any.
    pub fn try_step(&mut self) -> bool {
        match self.consumer.try_pop() {
            Some(request) => {
                self.handle(request);
                true
            }
            None => false,
        }
    }

    /// Handle one request, parking until it arrives.
    pub fn step_blocking(&mut self) {
        while !self.try_step() {
            thread::park();
        }
    }

    /// Serve requests forever.
    pub fn run(mut self) {
        loop {
            self.step_blocking();
        }
    }

    /// Render `line` straight into `out`, bypassing the pool.
    pub fn render_now(&mut self, line: usize, out: &mut [Pixel]) {
        self.video.render_line(&*self.bus, line, out);
    }

    fn handle(&mut self, request: LineRequest) {
        let LineRequest::Line(line) = request else {
            return;
        };
        let next = self.line_ahead(line);
        self.video.render_line(&*self.bus, next, &mut self.scratch);
        self.pool.publish(next, &self.scratch);
        self.rendered += 1;

        if line == self.vsync_on {
            self.sync.set_vsync(true);
        } else if line == VSYNC_OFF {
            self.sync.set_vsync(false);
        }
    }
}

impl Observable for RenderWorker {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "rendered" => Some(self.rendered.into()),
            "pool" => Some(self.pool.len().into()),
            _ => self.video.query(path),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["rendered", "pool", "mode", "vdg.<path>", "teletext.<path>"]
    }
}
