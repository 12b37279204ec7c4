//! Interactive space-colonization viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the growth state (tree,
//! configuration, run budget, seeded RNG) and implements [`eframe::App`]
//! to draw the tree and edit its parameters.

use eframe::App;
use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use venation_core::{Config, GrowthRun, Tree, types::NodeId};

/// Size of the drawing surface the default configuration is laid out on.
const CANVAS_SIZE: DVec2 = DVec2::new(600.0, 400.0);

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The growth core: [`Tree`], [`GrowthRun`] and [`Config`].
/// - UI configuration (pan/zoom, timing, seed).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the render-eligible segments and, with the debug overlay on,
///    attractors and claim lines.
///
/// ### Fields
/// - `tree` - Current tree being grown.
/// - `cfg` - Parameters edited through the side panel.
/// - `run` - Iteration budget of the current run; `None` if `cfg` is invalid.
/// - `error` - Last configuration error, shown instead of running.
///
/// - `seed` - Seed of the current run.
/// - `rng` - Generator seeded from `seed`, shared by init and steps.
///
/// - `running` - Whether the run is currently auto-advancing.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `last_new_ids` - Node ids created in the last step (for highlighting).
///
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
pub struct Viewer {
    tree: Tree,
    cfg: Config,
    run: Option<GrowthRun>,
    error: Option<String>,

    seed: u64,
    rng: Pcg32,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_new_ids: Vec<NodeId>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer with [`Config::default`] and starts growing
    /// straight away; the camera fits the 600x400 canvas.
    pub fn new() -> Self {
        let cfg = Config::default();
        let seed = 1;

        let mut viewer = Self {
            tree: Tree::from_positions(cfg.root, Vec::new()),
            cfg,
            run: None,
            error: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            running: false,
            zoom: 1.5,
            pan: egui::vec2(0.0, 0.0),
            last_new_ids: Vec::with_capacity(16),
            step_interval: 0.02,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.restart();
        viewer
    }

    /// Re-initializes the tree and the run budget from `cfg` and `seed`,
    /// then resumes auto-running.
    ///
    /// Camera settings are kept. An invalid configuration leaves an
    /// empty tree and stores the error for display.
    fn restart(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.last_new_ids.clear();
        self.last_step_time = 0.0;

        let started = GrowthRun::new(self.cfg).and_then(|run| {
            let tree = Tree::initialize(&self.cfg, &mut self.rng)?;
            Ok((run, tree))
        });

        match started {
            Ok((run, tree)) => {
                self.tree = tree;
                self.run = Some(run);
                self.error = None;
                self.running = true;
            }
            Err(err) => {
                log::warn!("cannot start growth run: {err}");
                self.tree = Tree::from_positions(self.cfg.root, Vec::new());
                self.run = None;
                self.error = Some(err.to_string());
                self.running = false;
            }
        }
    }

    /// Restarts with the next seed.
    fn reseed(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        self.restart();
    }

    /// Advances the run by a single step and re-applies the render budget.
    ///
    /// The ids of nodes created in this step are stored in `last_new_ids`
    /// so they can be highlighted in the next frame. Auto-running stops
    /// once the run's iteration budget is spent.
    fn step_once(&mut self) {
        let Some(run) = self.run.as_mut() else {
            self.running = false;
            return;
        };

        match run.advance(&mut self.tree, &mut self.rng) {
            Ok(Some(report)) => {
                self.last_new_ids = report.spawned;
                self.tree.apply_render_budget(&self.cfg);
            }
            Ok(None) => {
                self.last_new_ids.clear();
                self.running = false;
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.running = false;
            }
        }
    }

    /// Inserts an attractor at a world position, possibly waking a branch.
    fn insert_attractor(&mut self, pos: DVec2) {
        let id = self.tree.add_attractor(pos);
        log::debug!("inserted attractor {id} at {pos:?}");
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates follow the drawing canvas (y grows downward), so
    /// no axis is flipped: the canvas centre maps to the centre of `rect`,
    /// scaled by `zoom` and offset by `pan`.
    fn world_to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let local = (p - CANVAS_SIZE * 0.5).as_vec2();
        egui::pos2(
            center.x + local.x * self.zoom + self.pan.x,
            center.y + local.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (p.y - center.y - self.pan.y) / self.zoom;
        DVec2::new(x as f64, y as f64) + CANVAS_SIZE * 0.5
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let can_run = self.run.as_ref().is_some_and(|r| !r.is_finished());
                if ui
                    .add_enabled(
                        can_run,
                        egui::Button::new(if self.running { "⏸ Pause" } else { "▶ Run" }),
                    )
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.add_enabled(can_run, egui::Button::new("Step")).clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Restart").clicked() {
                    self.restart();
                }

                if ui.button("New seed").clicked() {
                    self.reseed();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (progress, node count, live attractors).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                if let Some(run) = &self.run {
                    ui.label(format!(
                        "step {}/{}",
                        run.iterations(),
                        run.config().max_iterations
                    ));
                }
                ui.label(format!("seed = {}", self.seed));
                ui.separator();
                ui.label(format!("nodes = {}", self.tree.nodes.len()));
                ui.label(format!("active = {}", self.tree.active_node_ids().len()));
                ui.label(format!(
                    "live attractors = {}",
                    self.tree.live_attractor_count()
                ));
                ui.label(format!("culled = {}", self.tree.culled_tail.len()));
            });
        });
    }

    /// Builds the right-hand parameter panel.
    ///
    /// Growth parameters restart the run when released; the render budget
    /// only re-culls and the overlay toggle only redraws.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");

                let mut restart = false;

                ui.separator();
                ui.label("Radii");
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.max_distance, 70.0..=150.0)
                            .step_by(10.0)
                            .text("max distance"),
                    )
                    .committed();
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.kill_distance, 3.0..=30.0)
                            .text("kill distance"),
                    )
                    .committed();

                ui.separator();
                ui.label("Growth");
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.segment_length, 3.0..=20.0)
                            .text("segment length"),
                    )
                    .committed();
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.attractor_count, 50..=4000)
                            .step_by(50.0)
                            .text("attractors"),
                    )
                    .committed();
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.max_iterations, 1..=1000)
                            .text("iterations"),
                    )
                    .committed();
                restart |= ui
                    .add(
                        egui::Slider::new(&mut self.cfg.kill_jitter, 0.0..=5.0)
                            .text("kill jitter"),
                    )
                    .committed();

                ui.separator();
                ui.label("Rendering");
                if ui
                    .add(
                        egui::Slider::new(&mut self.cfg.render_budget_percent, 0.0..=100.0)
                            .suffix(" %")
                            .text("render budget"),
                    )
                    .changed()
                {
                    self.tree.apply_render_budget(&self.cfg);
                }
                ui.checkbox(&mut self.cfg.debug_overlay, "debug overlay");

                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                if ui.button("Reset parameters").clicked() {
                    self.cfg = Config::default();
                    restart = true;
                }

                if restart {
                    self.restart();
                }
            });
    }

    /// Draws segments and, with the debug overlay, attractors and claims.
    fn draw_tree(&self, painter: &egui::Painter, rect: egui::Rect) {
        if self.cfg.debug_overlay {
            for a in &self.tree.attractors.points {
                let p = self.world_to_screen(a.pos, rect);
                let color = if a.consumed {
                    egui::Color32::from_rgb(60, 90, 220)
                } else {
                    egui::Color32::WHITE
                };
                painter.circle_filled(p, 2.0, color);
            }

            let claim_stroke = egui::Stroke::new(1.0, egui::Color32::GRAY);
            for node in self.tree.nodes.iter().filter(|n| n.parent.is_some()) {
                let Ok(targets) = self.tree.live_claim_positions(node.index) else {
                    continue;
                };
                let from = self.world_to_screen(node.pos, rect);
                for target in targets {
                    painter.line_segment([from, self.world_to_screen(target, rect)], claim_stroke);
                }
            }
        }

        let branch = egui::Stroke::new(1.0, egui::Color32::RED);
        for (from, to, eligible) in self.tree.segments() {
            if !eligible {
                continue;
            }
            let a = self.world_to_screen(from, rect);
            let b = self.world_to_screen(to, rect);
            painter.line_segment([a, b], branch);
        }

        for &id in &self.last_new_ids {
            if let Ok(node) = self.tree.node(id) {
                let p = self.world_to_screen(node.pos, rect);
                painter.circle_filled(p, 2.5, egui::Color32::YELLOW);
            }
        }
    }

    /// Builds the central panel where the tree is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Click inserts an attractor.
            if response.clicked()
                && let Some(p) = response.hover_pos()
            {
                let world = self.screen_to_world(p, rect);
                self.insert_attractor(world);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.draw_tree(&painter, rect);

            // Auto-run if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

/// Slider edits count once the drag is released or on a non-drag change
/// (click, keyboard), so a run is not restarted on every drag frame.
trait Committed {
    fn committed(&self) -> bool;
}

impl Committed for egui::Response {
    fn committed(&self) -> bool {
        self.drag_stopped() || (self.changed() && !self.dragged())
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
