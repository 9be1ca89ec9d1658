//! Top-level board: shadow bus, renderers, audio and the threads that
//! run them.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

use emu_core::{MasterClock, Observable, Pixel, Value};
use log::info;
use motorola_6845::Crtc6845;
use motorola_6847::{ACTIVE_HEIGHT, VdgSettings};
use ringbuf::HeapRb;
use ringbuf::traits::Split;
use shadow_bus::{CapturePort, Permission, ShadowBus};

use crate::audio::{AudioEventConsumer, AudioTimer, SampleSink, SidCommand};
use crate::config::{AtomDviConfig, DisplayTiming, Platform};
use crate::console::Console;
use crate::events::{EventDispatcher, EventPump, ResetLine};
use crate::line_pool::{LineRequester, RenderWorker, SyncOutput, line_pipeline};
use crate::map::{
    ATOM_PIA_A, ATOM_PIA_C, COL80_BASE, COL80_LEN, DRAGON_PIA_B, FB_ADDR, FB_LEN, TELETEXT_CRTA,
    TELETEXT_CRTB, TELETEXT_REG_FLAGS,
};
use crate::vga80;
use crate::video::VideoPipeline;

/// Everything the board runs, split by execution context.
pub struct AtomDviParts {
    /// Capture hardware side.
    pub capture: CapturePort,
    /// Display driver side.
    pub requester: LineRequester,
    pub worker: RenderWorker,
    pub events: EventPump,
    pub audio: AudioEventConsumer,
    pub timer: AudioTimer,
    pub reset: ResetLine,
}

/// The running board: what stays with the caller after [`AtomDvi::spawn`].
pub struct RunningAtomDvi {
    pub capture: CapturePort,
    pub requester: LineRequester,
    pub reset: ResetLine,
    pub bus: Arc<ShadowBus>,
    pub threads: Vec<JoinHandle<()>>,
}

/// An Atom DVI board.
pub struct AtomDvi {
    bus: Arc<ShadowBus>,
    crtc: Arc<Crtc6845>,
    timing: DisplayTiming,
    parts: AtomDviParts,
}

impl AtomDvi {
    /// Build the board: claim shadow memory, reset the registers and
    /// power up the SID.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`AtomDviConfig::validate`].
    #[must_use]
    pub fn new(config: AtomDviConfig) -> Self {
        config.validate();
        let AtomDviConfig {
            platform,
            timing,
            vdu_ram_enabled,
            emulate_reset,
            line_pool_size,
            event_capacity,
            audio_fifo_capacity,
            sid_model,
            bus_clock_hz,
            sample_rate,
            artifact,
            lowercase,
            teletext_enabled,
            fonts,
        } = config;
        info!(
            "Atom DVI: {platform:?}, {}x{}, teletext {}",
            timing.h_active,
            timing.v_active,
            if teletext_enabled { "on" } else { "off" }
        );

        let bus = Arc::new(ShadowBus::new(event_capacity));
        claim_video(&bus, platform, vdu_ram_enabled, teletext_enabled);
        vga80::reset_registers(&bus);
        if emulate_reset {
            Console::new().print(&bus, "\x0CACORN ATOM");
        }

        let crtc = Arc::new(Crtc6845::new());
        let settings = VdgSettings {
            artifact,
            lowercase,
            ..VdgSettings::default()
        };
        let video = VideoPipeline::new(
            platform,
            timing,
            fonts,
            settings,
            teletext_enabled,
            Arc::clone(&crtc),
        );
        let vsync_on = ACTIVE_HEIGHT + video.vdg().vertical_offset();
        let (requester, worker) = line_pipeline(
            line_pool_size,
            timing.h_active,
            timing.v_active,
            vsync_on,
            Arc::clone(&bus),
            video,
        );

        let clock = MasterClock::new(bus_clock_hz);
        let (producer, consumer) = HeapRb::<SidCommand>::new(audio_fifo_capacity).split();
        let audio = AudioEventConsumer::new(Arc::clone(&bus), consumer, sid_model, clock, sample_rate);
        let pending_reset = Arc::new(AtomicBool::new(false));
        let dispatcher = EventDispatcher::new(producer, Arc::clone(&pending_reset), Arc::clone(&crtc));

        let parts = AtomDviParts {
            capture: bus.capture_port(),
            requester,
            worker,
            events: EventPump::new(bus.event_reader(), dispatcher),
            audio,
            timer: AudioTimer::new(clock, sample_rate),
            reset: ResetLine::new(Arc::clone(&bus), pending_reset),
        };
        if let Some(window) = bus.permission_window() {
            info!("capture window {:#06X}..={:#06X}", window.start(), window.end());
        }
        Self {
            bus,
            crtc,
            timing,
            parts,
        }
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<ShadowBus> {
        &self.bus
    }

    #[must_use]
    pub fn crtc(&self) -> &Arc<Crtc6845> {
        &self.crtc
    }

    #[must_use]
    pub fn timing(&self) -> DisplayTiming {
        self.timing
    }

    /// The capture port, for driving host bus cycles directly.
    pub fn capture(&mut self) -> &mut CapturePort {
        &mut self.parts.capture
    }

    /// Host write cycle followed by an immediate interrupt service.
    pub fn bus_write(&mut self, address: u16, value: u8) -> bool {
        let captured = self.parts.capture.bus_write(address, value);
        self.parts.events.step();
        captured
    }

    pub fn bus_read(&mut self, address: u16) -> Option<u8> {
        self.parts.capture.bus_read(address)
    }

    /// Service the capture interrupt: drain every pending event.
    pub fn pump_events(&mut self) -> usize {
        self.parts.events.step()
    }

    /// Pulse the host reset line.
    pub fn reset(&mut self) {
        self.parts.reset.pulse();
    }

    /// Run one audio sample period.
    pub fn tick_audio(&mut self, sink: &mut dyn SampleSink) {
        self.parts.audio.tick(sink);
    }

    /// Render `line` synchronously, outside the line pool.
    pub fn render_line(&mut self, line: usize, out: &mut [Pixel]) {
        self.parts.worker.render_now(line, out);
    }

    /// Render a whole frame synchronously, top to bottom.
    #[must_use]
    pub fn render_frame(&mut self) -> Vec<Pixel> {
        let DisplayTiming { h_active, v_active } = self.timing;
        let mut frame = vec![0; h_active * v_active];
        for (line, out) in frame.chunks_exact_mut(h_active).enumerate() {
            self.parts.worker.render_now(line, out);
        }
        frame
    }

    #[must_use]
    pub fn into_parts(self) -> AtomDviParts {
        self.parts
    }

    /// Start the render worker, event pump and audio timer threads.
    pub fn spawn(
        self,
        sink: impl SampleSink + Send + 'static,
        sync: Box<dyn SyncOutput + Send>,
    ) -> io::Result<RunningAtomDvi> {
        let bus = Arc::clone(&self.bus);
        let AtomDviParts {
            mut capture,
            mut requester,
            mut worker,
            events,
            audio,
            timer,
            mut reset,
        } = self.parts;

        worker.set_sync_output(sync);
        let render = thread::Builder::new()
            .name("render".into())
            .spawn(move || worker.run())?;
        requester.set_worker(render.thread().clone());

        let pump = thread::Builder::new()
            .name("events".into())
            .spawn(move || events.run())?;
        capture.set_interrupt_target(pump.thread().clone());
        reset.set_pump(pump.thread().clone());

        let sound = thread::Builder::new()
            .name("audio".into())
            .spawn(move || timer.run(audio, sink))?;

        info!("render, event and audio threads started");
        Ok(RunningAtomDvi {
            capture,
            requester,
            reset,
            bus,
            threads: vec![render, pump, sound],
        })
    }
}

/// Tag the video registers and memory for capture.
fn claim_video(bus: &ShadowBus, platform: Platform, vdu_ram_enabled: bool, teletext: bool) {
    let video_ram = if vdu_ram_enabled {
        Permission::READ_WRITE
    } else {
        Permission::WRITE_ONLY
    };
    bus.set_permission(FB_ADDR, FB_LEN, video_ram);
    // 0xF000..0xF400 stays unclaimed: no renderer reads it.
    match platform {
        Platform::Atom => {
            bus.set_permission_byte(ATOM_PIA_A, Permission::WRITE_ONLY);
            bus.set_permission_byte(ATOM_PIA_C, Permission::WRITE_ONLY);
        }
        Platform::Dragon => bus.set_permission_byte(DRAGON_PIA_B, Permission::WRITE_ONLY),
    }
    bus.set_permission(COL80_BASE, COL80_LEN, Permission::READ_WRITE);
    if teletext {
        bus.set_permission_byte(TELETEXT_CRTA, Permission::WRITE_ONLY);
        bus.set_permission_byte(TELETEXT_CRTB, Permission::WRITE_ONLY);
        bus.set_permission_byte(TELETEXT_REG_FLAGS, Permission::READ_WRITE);
    }
}

impl Observable for AtomDvi {
    fn query(&self, path: &str) -> Option<Value> {
        let (prefix, rest) = path.split_once('.').unwrap_or((path, ""));
        match prefix {
            "video" => self.parts.worker.query(rest),
            "audio" => self.parts.audio.query(rest),
            "events" => self.parts.events.query(rest),
            "crtc" => self.crtc.query(rest),
            "lines_dropped" => Some(self.parts.requester.dropped().into()),
            "paused" => Some(self.bus.is_paused().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "video.<path>",
            "audio.<path>",
            "events.<path>",
            "crtc.<path>",
            "lines_dropped",
            "paused",
        ]
    }
}
