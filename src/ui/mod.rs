use crate::app::MediaConverterApp;
use crate::constants::{APP_NAME, COMMON_TARGET_EXTENSIONS, REPAINT_INTERVAL_MS};
use crate::state::EngineStatus;
use eframe::egui;

impl eframe::App for MediaConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_status();

        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        ctx.set_style(style);
        ctx.set_visuals(egui::Visuals::dark());

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(15.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new(APP_NAME).size(28.0).color(egui::Color32::WHITE).strong());
                    self.show_engine_badge(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(10.0);
            egui::Frame::none()
                .fill(egui::Color32::from_gray(30))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(45)))
                .rounding(10.0)
                .inner_margin(20.0)
                .show(ui, |ui| {
                    ui.vertical(|ui| {
                        self.show_file_picker(ui);
                        if self.workflow.selection.has_file() {
                            ui.add_space(8.0);
                            self.show_extensions(ui);
                        }
                        ui.add_space(12.0);
                        self.show_convert_button(ui);
                    });
                });

            ui.add_space(15.0);
            self.show_status_card(ui);
        });

        if self.workflow.state.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(REPAINT_INTERVAL_MS));
        }
    }
}

impl MediaConverterApp {
    fn show_engine_badge(&self, ui: &mut egui::Ui) {
        let (text, color) = match self.workflow.state.engine_status() {
            EngineStatus::Unready => ("Engine not loaded", egui::Color32::from_rgb(255, 165, 0)),
            EngineStatus::Loading => ("Loading engine...", egui::Color32::LIGHT_BLUE),
            EngineStatus::Ready => ("Engine ready", egui::Color32::LIGHT_GREEN),
        };
        ui.label(egui::RichText::new(text).size(13.0).color(color));
    }

    fn show_file_picker(&mut self, ui: &mut egui::Ui) {
        let enabled = self.workflow.state.file_input_enabled();

        ui.horizontal(|ui| {
            let button = egui::Button::new("📁 Choose image or video").min_size(egui::vec2(200.0, 32.0));
            if ui.add_enabled(enabled, button).clicked() {
                self.select_input();
            }

            match self.workflow.selection.file() {
                Some(file) => {
                    ui.label(egui::RichText::new(&file.name).strong());
                    ui.label(egui::RichText::new(file.size_human_readable()).color(egui::Color32::GRAY));
                }
                None => {
                    ui.label(egui::RichText::new("No file chosen").color(egui::Color32::GRAY));
                }
            }
        });
    }

    fn show_extensions(&mut self, ui: &mut egui::Ui) {
        let enabled = self.workflow.state.target_input_enabled();
        let mut from = self
            .workflow
            .selection
            .file()
            .map(|f| f.inferred_extension.clone())
            .unwrap_or_default();
        let mut target = self.workflow.selection.target_extension.clone();

        egui::Grid::new("extensions")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("From:").strong());
                ui.add_enabled(
                    false,
                    egui::TextEdit::singleline(&mut from).hint_text("from extension").desired_width(200.0),
                );
                ui.end_row();

                ui.label(egui::RichText::new("To:").strong());
                ui.add_enabled(
                    enabled,
                    egui::TextEdit::singleline(&mut target).hint_text("output extension").desired_width(200.0),
                );
                ui.end_row();
            });

        ui.horizontal_wrapped(|ui| {
            for ext in COMMON_TARGET_EXTENSIONS {
                if ui.add_enabled(enabled, egui::SelectableLabel::new(target == *ext, *ext)).clicked() {
                    target = ext.to_string();
                }
            }
        });

        if target != self.workflow.selection.target_extension {
            if let Err(e) = self.workflow.set_target_extension(&target) {
                tracing::debug!("Ignored extension edit: {}", e);
            }
        }
    }

    fn show_convert_button(&mut self, ui: &mut egui::Ui) {
        let enabled = self.workflow.state.trigger_enabled();

        ui.vertical_centered(|ui| {
            if self.workflow.state.is_busy() {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new().size(24.0));
                    let label = if self.workflow.state.is_converting() {
                        match self.workflow.state.elapsed() {
                            Some(elapsed) => format!("Converting... {}s", elapsed.as_secs()),
                            None => "Converting...".to_string(),
                        }
                    } else {
                        "Loading engine...".to_string()
                    };
                    ui.label(egui::RichText::new(label).size(16.0));
                });
            } else {
                let button = egui::Button::new(egui::RichText::new("Convert 🚀").size(16.0).strong())
                    .fill(egui::Color32::from_rgb(37, 99, 235))
                    .min_size(egui::vec2(180.0, 45.0));
                if ui.add_enabled(enabled, button).clicked() {
                    self.start_conversion();
                }
            }
        });
    }

    fn show_status_card(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = self.workflow.state.last_error() {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(200, 50, 50, 50))
                .rounding(8.0)
                .inner_margin(15.0)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("❌ Error").color(egui::Color32::LIGHT_RED).strong());
                    ui.label(egui::RichText::new(error).color(egui::Color32::LIGHT_RED));
                });
        } else if let Some(saved) = self.workflow.state.last_saved() {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(50, 200, 50, 50))
                .rounding(8.0)
                .inner_margin(15.0)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("✅ Saved").color(egui::Color32::LIGHT_GREEN).strong());
                    ui.label(saved.display().to_string());
                });
        }
    }
}
