//! Live yawning monitor.
//!
//! Grabs frames from a webcam, classifies each one, and shows the verdict
//! over the video. Press Escape to quit.
//!
//! Run with: cargo run --bin yawncam-live

use clap::Parser;
use eframe::egui;
use image::imageops;
use std::path::PathBuf;
use std::time::Instant;
use yawncam::{mark_inner_lip, CameraStream, YawnAnalyzer, YawnStatus};

#[derive(Parser, Debug)]
#[command(name = "yawncam-live")]
#[command(author, version, about = "Live yawning monitor", long_about = None)]
struct Args {
    /// Camera device index
    #[arg(short, long, default_value_t = 0)]
    camera: u32,

    /// Face detector model path
    #[arg(long, default_value = "seeta_fd_frontal_v1.0.bin")]
    detector: PathBuf,

    /// Landmark model path (.dat, .dat.bz2, or native .bin)
    #[arg(long, default_value = "shape_predictor_68_face_landmarks.dat")]
    landmarks: PathBuf,

    /// Minimum face size for detection
    #[arg(long, default_value_t = yawncam::DEFAULT_MIN_FACE_SIZE)]
    min_face_size: u32,

    /// List capture devices and exit
    #[arg(long)]
    list_cameras: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if args.list_cameras {
        for (index, name) in CameraStream::list() {
            println!("{}: {}", index, name);
        }
        return Ok(());
    }

    let analyzer =
        match YawnAnalyzer::from_files(&args.detector, &args.landmarks, args.min_face_size) {
            Ok(analyzer) => analyzer,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

    let camera = match CameraStream::open(args.camera) {
        Ok(camera) => camera,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let (width, height) = camera.resolution();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32 + 16.0, height as f32 + 16.0]),
        ..Default::default()
    };

    eframe::run_native(
        "yawncam",
        options,
        Box::new(move |_cc| Ok(Box::new(MonitorApp::new(camera, analyzer)))),
    )
}

struct MonitorApp {
    camera: CameraStream,
    analyzer: YawnAnalyzer,
    texture: Option<egui::TextureHandle>,
    status: YawnStatus,
    ratio: Option<f32>,

    // Frame-rate accounting
    frames: u32,
    fps: f32,
    window_start: Instant,
}

impl MonitorApp {
    fn new(camera: CameraStream, analyzer: YawnAnalyzer) -> Self {
        Self {
            camera,
            analyzer,
            texture: None,
            status: YawnStatus::NoDetect,
            ratio: None,
            frames: 0,
            fps: 0.0,
            window_start: Instant::now(),
        }
    }

    /// Grab one frame, classify it, and upload the annotated copy.
    ///
    /// The blocking camera read paces the whole loop. A failed grab keeps
    /// the previous frame on screen.
    fn step(&mut self, ctx: &egui::Context) {
        let mut frame = match self.camera.grab() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame capture failed: {}", e);
                return;
            }
        };

        let gray = imageops::grayscale(&frame);
        let analysis = self.analyzer.analyze(&gray);
        self.status = analysis.status;
        self.ratio = analysis.ratio;

        if let Some(ref lm) = analysis.landmarks {
            mark_inner_lip(&mut frame, lm);
        }

        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
        match self.texture {
            Some(ref mut texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("camera", color_image, egui::TextureOptions::LINEAR));
            }
        }

        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        self.step(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(ref texture) = self.texture else {
                ui.centered_and_justified(|ui| {
                    ui.heading("Waiting for the first frame...");
                });
                return;
            };

            let available_size = ui.available_size();
            let texture_size = texture.size_vec2();

            // Scale to fit
            let scale = (available_size.x / texture_size.x)
                .min(available_size.y / texture_size.y)
                .min(1.0);
            let display_size = texture_size * scale;

            let response = ui.centered_and_justified(|ui| ui.image((texture.id(), display_size)));
            let image_rect = response.inner.rect;

            draw_verdict(ui.painter(), image_rect, self.status, self.ratio, self.fps);
        });

        ctx.request_repaint();
    }
}

/// Verdict banner near the bottom-left corner, plus a small stat line.
fn draw_verdict(
    painter: &egui::Painter,
    frame_rect: egui::Rect,
    status: YawnStatus,
    ratio: Option<f32>,
    fps: f32,
) {
    use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect, Vec2};

    let banner = Rect::from_min_size(
        Pos2::new(frame_rect.left() + 24.0, frame_rect.bottom() - 72.0),
        Vec2::new(190.0, 44.0),
    );
    painter.rect_filled(banner.expand(3.0), CornerRadius::ZERO, Color32::BLACK);
    painter.rect_filled(banner, CornerRadius::ZERO, Color32::WHITE);
    painter.text(
        Pos2::new(banner.left() + 12.0, banner.center().y),
        Align2::LEFT_CENTER,
        status.label(),
        FontId::proportional(28.0),
        Color32::RED,
    );

    let stats = match ratio {
        Some(ratio) => format!("ratio {:.2}  {:.1} fps", ratio, fps),
        None => format!("{:.1} fps", fps),
    };
    painter.text(
        Pos2::new(frame_rect.left() + 8.0, frame_rect.top() + 8.0),
        Align2::LEFT_TOP,
        stats,
        FontId::monospace(13.0),
        Color32::LIGHT_GRAY,
    );
}
