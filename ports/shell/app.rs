/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Owns the window, the single tab, and the cooperative poll loop: it polls
//! the window event queue, then calls `composite_raster_and_draw`, then
//! schedules the next animation frame.
//!
//! `wisp-dom`/`wisp-display-list`'s trees are `Rc`-based, so layout and
//! element trees never leave the thread that builds them, and a real OS
//! thread per tab would need `unsafe impl Send`. This shell instead runs
//! the tab's task queue and the UI's composite/raster/draw on the same OS
//! thread, alternating them the way a real embedder's UI and script roles
//! alternate conceptually — `task.rs`'s `TaskRunner` and `commit.rs`'s
//! `CommitChannel` stay exactly as written for a real multi-threaded
//! embedder, they're just drained cooperatively here rather than by a
//! second `std::thread::spawn`.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use compositing::Pipeline;
use display_list::{Canvas, DisplayRef, Surface};
use fonts::BuiltinFontLibrary;
use net::BlockingHttpClient;
use profile::Profiler;
use rustc_hash::FxHashMap;
use script::{CommitChannel, NullScriptContext, Tab, TaskKind, TaskRunner};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::canvas::RasterSurface;

const TAB_ID: u64 = 1;

struct Windowing {
    window: Rc<Window>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
}

/// The `ApplicationHandler` driving everything: a `winit::EventLoop` calls
/// back into this for window events and idle ticks (`about_to_wait`), which
/// together form the cooperative poll loop.
struct App {
    windowing: Option<Windowing>,
    tab: Tab,
    task_runner: TaskRunner,
    channel: Arc<CommitChannel>,
    pipeline: Pipeline,
    profiler: Option<Profiler>,
    cursor: (f32, f32),
    next_animation_frame: Option<Instant>,
    last_display_list: Option<DisplayRef>,
    last_composited_updates: FxHashMap<usize, DisplayRef>,
}

impl App {
    fn new(url: String, profiler: Option<Profiler>) -> App {
        let channel = CommitChannel::new();
        channel.set_active_tab(TAB_ID);

        let tab = Tab::new(
            TAB_ID,
            Box::new(BlockingHttpClient),
            Arc::new(BuiltinFontLibrary::new()),
            Box::new(NullScriptContext::new()),
            channel.clone(),
            config::HEIGHT as f32,
        );

        let task_runner = TaskRunner::new();
        task_runner.schedule_task(TaskKind::Load { url, body: None });

        App {
            windowing: None,
            tab,
            task_runner,
            channel,
            pipeline: Pipeline::new(),
            profiler,
            cursor: (0.0, 0.0),
            next_animation_frame: None,
            last_display_list: None,
            last_composited_updates: FxHashMap::default(),
        }
    }

    /// Drains every task currently queued, running each to completion and
    /// committing afterwards. FIFO order and no two tasks on the same tab
    /// running concurrently are trivially true with one thread.
    fn drain_tasks(&mut self) {
        while let Some(task) = self.task_runner.try_next_task() {
            if let Some(profiler) = &self.profiler {
                profiler.time("task");
                self.tab.handle_task(task);
                profiler.stop("task");
            } else {
                self.tab.handle_task(task);
            }
        }
    }

    /// Runs whatever `composite_raster_and_draw` requires from the last
    /// commit and blits the result, then re-arms the animation timer if the
    /// tab still wants one.
    fn render(&mut self) {
        if self.windowing.is_none() {
            return;
        }

        let (scroll, wants_animation_frame) = {
            let mut state = self.channel.lock();
            if let Some(root) = state.display_list.take() {
                self.last_display_list = Some(root);
            }
            if !state.composited_updates.is_empty() {
                self.last_composited_updates = std::mem::take(&mut state.composited_updates);
            }
            // The UI thread owns `dirty` exclusively once past the commit;
            // merge it into the pipeline's own copy and reset it here rather
            // than leaving it for `Pipeline` to clear twice.
            self.pipeline.dirty.needs_composite |= state.dirty.needs_composite;
            self.pipeline.dirty.needs_raster |= state.dirty.needs_raster;
            self.pipeline.dirty.needs_draw |= state.dirty.needs_draw;
            state.dirty.clear();
            (state.active_tab_scroll, state.wants_animation_frame)
        };

        if let Some(root) = self.last_display_list.clone() {
            let mut window_surface = window_canvas_factory();
            let draw_list = if let Some(profiler) = &self.profiler {
                profiler.time("composite_raster_and_draw");
                let draw_list = self.pipeline.composite_raster_and_draw(
                    &root,
                    &self.last_composited_updates,
                    window_surface.as_canvas(),
                );
                profiler.stop("composite_raster_and_draw");
                draw_list
            } else {
                self.pipeline.composite_raster_and_draw(
                    &root,
                    &self.last_composited_updates,
                    window_surface.as_canvas(),
                )
            };
            if let Some(draw_list) = draw_list {
                self.blit(&draw_list, scroll);
            }
        }

        self.schedule_animation_frame(wants_animation_frame);
    }

    /// Executes the flat draw list into a window-sized `RasterSurface`
    /// (translated by `-scroll`: scroll only ever changes what's drawn,
    /// never layout) and presents it through `softbuffer`.
    fn blit(&mut self, draw_list: &[DisplayRef], scroll: f32) {
        let Some(windowing) = &mut self.windowing else { return };
        let size = windowing.window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let mut frame = RasterSurface::new(width as i32, height as i32);
        {
            frame.draw_rect(geometry::rect(0.0, 0.0, width as f32, height as f32), "white");
            frame.save();
            frame.translate(0.0, -scroll);
            for node in draw_list {
                node.borrow().execute(&mut frame);
            }
            frame.restore();
        }

        let Ok(mut buffer) = windowing.surface.buffer_mut() else { return };
        for (dst, src) in buffer.iter_mut().zip(frame.pixels()) {
            *dst = src & 0x00ff_ffff;
        }
        let _ = buffer.present();
    }

    /// Arms the animation timer iff the tab wants another animation frame
    /// and no timer is already armed. The timer itself is simulated with a
    /// wakeup `Instant` rather than a second thread; `about_to_wait` checks
    /// it.
    fn schedule_animation_frame(&mut self, wants_animation_frame: bool) {
        if !wants_animation_frame || self.next_animation_frame.is_some() {
            return;
        }
        let armed = {
            let mut state = self.channel.lock();
            if state.animation_timer_armed {
                true
            } else {
                state.animation_timer_armed = true;
                false
            }
        };
        if !armed {
            let interval = Duration::from_secs_f32(config::REFRESH_RATE_SEC);
            self.next_animation_frame = Some(Instant::now() + interval);
        }
    }
}

/// `softbuffer`'s window-backed surface can't itself execute paint
/// commands (it has no per-pixel drawing API, only `buffer_mut`/`present`),
/// so raster still goes through a plain `RasterSurface`, which only needs a
/// `Canvas` to hand out fresh composited-layer surfaces from
/// `create_surface`. A throwaway zero-sized one is enough for that.
fn window_canvas_factory() -> RasterSurface {
    RasterSurface::new(0, 0)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.windowing.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("wisp")
            .with_inner_size(LogicalSize::new(config::WIDTH as f64, config::HEIGHT as f64));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Rc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let context = match softbuffer::Context::new(window.clone()) {
            Ok(context) => context,
            Err(err) => {
                log::error!("failed to create graphics context: {err}");
                event_loop.exit();
                return;
            }
        };
        let mut surface = match softbuffer::Surface::new(&context, window.clone()) {
            Ok(surface) => surface,
            Err(err) => {
                log::error!("failed to create window surface: {err}");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        let _ = surface.resize(
            NonZeroU32::new(size.width.max(1)).unwrap(),
            NonZeroU32::new(size.height.max(1)).unwrap(),
        );

        if let Some(profiler) = &self.profiler {
            profiler.register_thread("ui");
        }

        window.request_redraw();
        self.windowing = Some(Windowing { window, surface });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.task_runner.set_needs_quit();
                if let Some(profiler) = &self.profiler {
                    profiler.finish();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(windowing) = &mut self.windowing {
                    let _ = windowing.surface.resize(
                        NonZeroU32::new(size.width.max(1)).unwrap(),
                        NonZeroU32::new(size.height.max(1)).unwrap(),
                    );
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let PhysicalPosition { x, y } = position;
                self.cursor = (x as f32, y as f32);
            }
            WindowEvent::MouseInput { state: ElementState::Released, button: MouseButton::Left, .. } => {
                self.task_runner.schedule_task(TaskKind::Click { x: self.cursor.0, y: self.cursor.1 });
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key {
                    Key::Named(NamedKey::ArrowDown) => {
                        self.task_runner.schedule_task(TaskKind::ScrollDown);
                    }
                    Key::Named(NamedKey::ArrowUp) => {
                        self.task_runner.schedule_task(TaskKind::ScrollUp);
                    }
                    Key::Named(NamedKey::Backspace) => {
                        self.task_runner.schedule_task(TaskKind::Backspace);
                    }
                    Key::Named(NamedKey::Enter) => {
                        self.task_runner.schedule_task(TaskKind::KeyPress { ch: '\n' });
                    }
                    Key::Character(ref text) => {
                        for ch in text.chars() {
                            if (' '..='~').contains(&ch) {
                                self.task_runner.schedule_task(TaskKind::KeyPress { ch });
                            }
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.drain_tasks();
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.drain_tasks();

        if let Some(deadline) = self.next_animation_frame {
            if Instant::now() >= deadline {
                self.next_animation_frame = None;
                self.task_runner.schedule_task(TaskKind::RunAnimationFrame);
                self.drain_tasks();
            }
        }

        self.render();

        event_loop.set_control_flow(match self.next_animation_frame {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }
}

/// Builds the event loop, the `App`, and runs it to completion. The CLI
/// calls this with its one `url` argument; the process exits with code 0
/// when the window is closed.
pub fn run(url: String) {
    let profiler = match Profiler::create("browser.json") {
        Ok(profiler) => Some(profiler),
        Err(err) => {
            log::warn!("failed to open browser.json for profiling: {err}");
            None
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("failed to create event loop: {err}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(url, profiler);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("event loop exited with error: {err}");
    }
}
