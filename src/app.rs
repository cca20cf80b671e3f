use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::LoadError;
use crate::loader::{LoadHandle, LoadRequest, Loader};
use crate::metadata::{self, ImageInfo};
use crate::render::{self, PanGesture};
use crate::session::{Command, Outcome, Session};
use crate::state::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS, TransitionKind};
use crate::transform::CropRect;
use crate::wallpaper::{self, WallpaperOutcome};

const DEFAULT_CROP_TEXT: &str = "100,100,400,300";

/// Keyboard shortcuts, matched without regard to modifiers.
const KEY_BINDINGS: &[(egui::Key, Command)] = &[
    (egui::Key::ArrowLeft, Command::Previous),
    (egui::Key::ArrowRight, Command::Next),
    (egui::Key::Space, Command::TogglePlay),
    (egui::Key::F11, Command::ToggleFullscreen),
    (egui::Key::Escape, Command::Quit),
    (egui::Key::Plus, Command::ZoomIn),
    (egui::Key::Equals, Command::ZoomIn),
    (egui::Key::Minus, Command::ZoomOut),
    (egui::Key::Num0, Command::ResetZoom),
];

fn command_for_key(key: egui::Key) -> Option<Command> {
    KEY_BINDINGS
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|(_, command)| *command)
}

/// Vertical wheel movement, one entry per wheel event.
fn wheel_notches(events: &[egui::Event]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::MouseWheel { delta, .. } if delta.y != 0.0 => Some(delta.y),
            _ => None,
        })
        .collect()
}

/// Paths of dropped files, or none while a modal is open.
fn dropped_paths(files: &[egui::DroppedFile], modal_open: bool) -> Vec<PathBuf> {
    if modal_open {
        return Vec::new();
    }
    files.iter().filter_map(|f| f.path.clone()).collect()
}

/// A modal message; input to the viewer is blocked until it is dismissed.
struct Notice {
    title: String,
    message: String,
}

impl Notice {
    fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

enum Prompt {
    Url(String),
    Crop(String),
}

/// Things the panels ask for; applied once all panels have been drawn.
enum UiAction {
    Run(Command),
    PickFolder,
    PromptUrl,
    PromptCrop,
    SetWallpaper,
    CancelLoad,
}

pub struct LanternApp {
    session: Session,
    loader: Loader,
    load_handle: Option<LoadHandle>,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    info: Option<ImageInfo>,
    info_shown: u64,
    pan: PanGesture,
    prompt: Option<Prompt>,
    notice: Option<Notice>,
    fullscreen: bool,
}

impl LanternApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let transition = config.resolve_transition();
        let mut app = Self {
            session: Session::new(config.interval(), transition),
            loader: Loader::new(),
            load_handle: None,
            texture: None,
            texture_revision: 0,
            info: None,
            info_shown: 0,
            pan: PanGesture::default(),
            prompt: None,
            notice: None,
            fullscreen: false,
        };
        if let Some(folder) = config.start_folder {
            app.start_load(&cc.egui_ctx, LoadRequest::Folder(folder));
        }
        app
    }

    fn start_load(&mut self, ctx: &egui::Context, request: LoadRequest) {
        let ctx2 = ctx.clone();
        let handle = self.loader.start(request, move || ctx2.request_repaint());
        info!(generation = handle.generation(), "load started");
        self.load_handle = Some(handle);
    }

    fn poll_loader(&mut self, now: Instant) {
        let Some(outcome) = self.loader.poll() else {
            return;
        };
        self.load_handle = None;
        if let Err(err) = self.session.apply_load(outcome, now) {
            warn!(error = %err, "load left the catalog unchanged");
            let title = match err {
                LoadError::NoImages { .. } => "No Images",
                _ => "Load Error",
            };
            self.notice = Some(Notice::new(title, err.to_string()));
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, command: Command, now: Instant) {
        match self.session.apply(command, now) {
            Outcome::Handled => {}
            Outcome::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.fullscreen));
            }
            Outcome::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Outcome::Rejected(err) => {
                self.notice = Some(Notice::new("Crop Error", err.to_string()));
            }
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: UiAction, now: Instant) {
        match action {
            UiAction::Run(command) => self.dispatch(ctx, command, now),
            UiAction::PickFolder => {
                if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                    self.start_load(ctx, LoadRequest::Folder(folder));
                }
            }
            UiAction::PromptUrl => self.prompt = Some(Prompt::Url(String::new())),
            UiAction::PromptCrop => {
                if !self.session.is_empty() {
                    self.prompt = Some(Prompt::Crop(DEFAULT_CROP_TEXT.to_string()));
                }
            }
            UiAction::SetWallpaper => self.apply_wallpaper(),
            UiAction::CancelLoad => {
                if let Some(handle) = self.load_handle.take() {
                    handle.cancel();
                }
            }
        }
    }

    fn apply_wallpaper(&mut self) {
        let Some(raster) = self.session.displayed() else {
            return;
        };
        let notice = match wallpaper::set_wallpaper(raster) {
            Ok(WallpaperOutcome::Applied(_)) => {
                Notice::new("Wallpaper", "Wallpaper set successfully!")
            }
            Ok(WallpaperOutcome::Unsupported { saved_to }) => Notice::new(
                "Wallpaper",
                format!(
                    "Setting the wallpaper is not supported on this platform.\nImage saved to: {}",
                    saved_to.display()
                ),
            ),
            Err(err) => {
                warn!(error = %err, "wallpaper failed");
                Notice::new("Wallpaper Error", format!("Failed to set wallpaper: {}", err))
            }
        };
        self.notice = Some(notice);
    }

    fn is_modal_open(&self) -> bool {
        self.prompt.is_some() || self.notice.is_some()
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let modal_open = self.is_modal_open();
        let dropped = ctx.input(|i| dropped_paths(&i.raw.dropped_files, modal_open));
        if !dropped.is_empty() {
            self.start_load(ctx, LoadRequest::Files(dropped));
        }
    }

    fn pressed_commands(&self, ctx: &egui::Context) -> Vec<Command> {
        if self.is_modal_open() || ctx.wants_keyboard_input() {
            return Vec::new();
        }
        ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key, pressed: true, ..
                    } => command_for_key(*key),
                    _ => None,
                })
                .collect()
        })
    }

    /// Re-uploads the displayed raster when the session has replaced it.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.texture_revision == self.session.revision() {
            return;
        }
        self.texture_revision = self.session.revision();
        self.texture = self.session.displayed().map(|raster| {
            let rgba = raster.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let img = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            ctx.load_texture("displayed_tex", img, egui::TextureOptions::LINEAR)
        });
    }

    fn sync_info(&mut self) {
        if self.info_shown == self.session.shown() {
            return;
        }
        self.info_shown = self.session.shown();
        self.info = self.session.current().map(metadata::describe);
    }

    fn show_toolbar(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let slideshow = *self.session.sequencer().state();
        ui.horizontal_wrapped(|ui| {
            if ui.button("Load Folder").clicked() {
                actions.push(UiAction::PickFolder);
            }
            if ui.button("Load URL").clicked() {
                actions.push(UiAction::PromptUrl);
            }
            ui.separator();

            if ui.button("⏮ Previous").clicked() {
                actions.push(UiAction::Run(Command::Previous));
            }
            let play_label = if slideshow.playing { "⏸ Pause" } else { "▶ Play" };
            if ui.button(play_label).clicked() {
                actions.push(UiAction::Run(Command::TogglePlay));
            }
            if ui.button("Next ⏭").clicked() {
                actions.push(UiAction::Run(Command::Next));
            }
            if ui.button("Fullscreen").clicked() {
                actions.push(UiAction::Run(Command::ToggleFullscreen));
            }
            ui.separator();

            ui.label("Interval");
            let mut interval = slideshow.interval_seconds;
            let slider = egui::Slider::new(&mut interval, MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS)
                .suffix(" s")
                .clamping(egui::SliderClamping::Always);
            if ui.add(slider).changed() {
                actions.push(UiAction::Run(Command::SetInterval(interval)));
            }

            let mut transition = slideshow.transition;
            egui::ComboBox::from_label("Transition")
                .selected_text(transition.label())
                .show_ui(ui, |ui| {
                    for kind in TransitionKind::ALL {
                        ui.selectable_value(&mut transition, kind, kind.label());
                    }
                });
            if transition != slideshow.transition {
                actions.push(UiAction::Run(Command::SetTransition(transition)));
            }
            ui.separator();

            ui.label("Zoom");
            let mut percent = self.session.view().zoom_percent();
            let slider = egui::Slider::new(&mut percent, 10_u32..=500_u32)
                .suffix("%")
                .clamping(egui::SliderClamping::Always);
            if ui.add(slider).changed() {
                actions.push(UiAction::Run(Command::SetZoomPercent(percent)));
            }
        });
    }

    fn show_edit_bar(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let has_image = self.session.displayed().is_some();
        ui.horizontal(|ui| {
            let buttons = [
                ("Crop", UiAction::PromptCrop),
                ("Rotate 90°", UiAction::Run(Command::Rotate)),
                ("Flip H", UiAction::Run(Command::FlipHorizontal)),
                ("Flip V", UiAction::Run(Command::FlipVertical)),
                ("Set Wallpaper", UiAction::SetWallpaper),
                ("Reset", UiAction::Run(Command::Reset)),
            ];
            for (label, action) in buttons {
                if ui.add_enabled(has_image, egui::Button::new(label)).clicked() {
                    actions.push(action);
                }
            }
        });
        ui.horizontal(|ui| {
            ui.label(self.session.status_line());
            let edit = self.session.edit();
            if self.session.is_cropped() {
                ui.label(egui::RichText::new("(cropped)").weak());
            } else if !edit.is_identity() {
                let mut parts = Vec::new();
                if edit.rotation.degrees() != 0 {
                    parts.push(format!("rotated {}°", edit.rotation.degrees()));
                }
                if edit.flip_horizontal {
                    parts.push("flipped H".to_string());
                }
                if edit.flip_vertical {
                    parts.push("flipped V".to_string());
                }
                ui.label(egui::RichText::new(format!("({})", parts.join(", "))).weak());
            }
            if self.loader.is_loading() {
                ui.separator();
                ui.spinner();
                ui.label("Loading…");
                if ui.small_button("Cancel").clicked() {
                    actions.push(UiAction::CancelLoad);
                }
            }
        });
    }

    fn show_info_panel(&self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Image Info").strong());
        ui.add_space(4.0);
        let Some(info) = &self.info else {
            ui.label(egui::RichText::new("No image loaded").weak());
            return;
        };
        egui::Grid::new("info_grid")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                let mut row = |label: &str, value: Option<String>| {
                    if let Some(v) = value {
                        ui.label(egui::RichText::new(label).weak());
                        ui.label(v);
                        ui.end_row();
                    }
                };

                row("Name", Some(info.name.clone()));
                row("Dimensions", Some(format!("{} x {}", info.width, info.height)));
                row("File size", info.file_size.map(metadata::format_file_size));
                row("Camera", info.camera.clone());
                row("Date", info.date_taken.clone());
            });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);

        let Some(tex) = &self.texture else {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Load a folder, a URL, or drop images here",
                egui::FontId::proportional(16.0),
                egui::Color32::GRAY,
            );
            return;
        };

        let [w, h] = tex.size();
        let cmd = render::draw_geometry(
            (w as u32, h as u32),
            (rect.width(), rect.height()),
            self.session.view(),
        );
        let img_rect = egui::Rect::from_min_size(
            rect.min + egui::vec2(cmd.x, cmd.y),
            egui::vec2(cmd.width, cmd.height),
        );
        painter.image(
            tex.id(),
            img_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE.gamma_multiply(cmd.alpha),
        );

        if self.is_modal_open() {
            return;
        }
        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pan.begin((pos.x, pos.y));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pan.drag_to((pos.x, pos.y), self.session.view_mut());
            }
        }
        if response.drag_stopped() {
            self.pan.end();
        }
        if self.pan.is_active() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
        if response.hovered() {
            for notches in ui.input(|i| wheel_notches(&i.events)) {
                actions.push(UiAction::Run(Command::WheelZoom(notches)));
            }
        }
    }

    fn show_prompt(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(prompt) = &mut self.prompt else {
            return;
        };
        let (title, hint, text) = match prompt {
            Prompt::Url(text) => ("Load URL", "Enter image URL:", text),
            Prompt::Crop(text) => ("Crop", "Enter crop dimensions (x,y,width,height):", text),
        };
        let mut submitted = false;
        let mut cancelled = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(hint);
                let response = ui.add(egui::TextEdit::singleline(text).desired_width(320.0));
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        submitted = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });

        if cancelled {
            self.prompt = None;
            return;
        }
        if !submitted {
            return;
        }
        match self.prompt.take() {
            Some(Prompt::Url(url)) => {
                // Blank input is a silent no-op, like cancelling.
                if !url.trim().is_empty() {
                    self.start_load(ctx, LoadRequest::Url(url));
                }
            }
            Some(Prompt::Crop(text)) => match text.parse::<CropRect>() {
                Ok(rect) => self.dispatch(ctx, Command::Crop(rect), now),
                Err(err) => self.notice = Some(Notice::new("Crop Error", err.to_string())),
            },
            None => {}
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(&notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for LanternApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Background loads and timers first, so this frame shows their result
        self.poll_loader(now);
        self.session.tick(now);
        self.handle_dropped_files(ctx);
        for command in self.pressed_commands(ctx) {
            self.dispatch(ctx, command, now);
        }
        self.sync_texture(ctx);
        self.sync_info();

        let mut actions = Vec::new();

        if !self.fullscreen {
            egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
                self.show_toolbar(ui, &mut actions);
            });
        }
        egui::TopBottomPanel::bottom("edit_bar").show(ctx, |ui| {
            self.show_edit_bar(ui, &mut actions);
        });
        if !self.fullscreen {
            egui::SidePanel::right("info_panel")
                .default_width(220.0)
                .show(ctx, |ui| {
                    self.show_info_panel(ui);
                });
        }
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                self.show_canvas(ui, &mut actions);
            });

        self.show_prompt(ctx, now);
        self.show_notice(ctx);

        if !self.is_modal_open() {
            for action in actions {
                self.handle_action(ctx, action, now);
            }
        }

        if let Some(at) = self.session.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(at.saturating_duration_since(Instant::now()));
        }
    }
}
