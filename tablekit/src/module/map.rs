use std::time::{Duration, Instant};

use data::map::{MapState, Point, TRAVEL_PRESETS, Unit};
use data::keys;
use egui::{Color32, Pos2, Sense, Stroke};

use crate::{UiExt, tr, ui::Status};

/// Pan and zoom are saved once they have settled for this long.
const VIEW_SAVE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
	Scale,
	Path,
}

pub struct MapMeasurer {
	uniform: crate::Uniform,

	state: MapState,
	texture: Option<egui::TextureHandle>,
	image_size: [f64; 2],
	tool: Tool,
	view_dirty_since: Option<Instant>,
	status: Status,
}

fn to_point(p: Pos2, origin: Pos2) -> Point {
	Point::new((p.x - origin.x) as f64, (p.y - origin.y) as f64)
}

fn to_pos(p: Point, origin: Pos2) -> Pos2 {
	Pos2::new(origin.x + p.x as f32, origin.y + p.y as f32)
}

fn scale_text(units_per_pixel: f64, unit: Unit) -> String {
	tr!("map-scale", upp = format!("{units_per_pixel:.4}"), unit = unit.label())
}

impl MapMeasurer {
	pub fn new(uniform: crate::Uniform) -> Self {
		let state = uniform.store.load_or_default::<MapState>(keys::MAP_MEASURER);
		Self {
			uniform,
			tool: if state.is_calibrated() { Tool::Path } else { Tool::Scale },
			state,
			texture: None,
			image_size: [0.0; 2],
			view_dirty_since: None,
			status: Status::Idle,
		}
	}

	fn persist(&mut self) {
		self.uniform.store.save(keys::MAP_MEASURER, &self.state);
		self.view_dirty_since = None;
	}

	/// Pan or zoom moved. Each change restarts the save delay.
	fn view_changed(&mut self, now: Instant) {
		self.view_dirty_since = Some(now);
	}

	fn tick_at(&mut self, now: Instant) {
		if self
			.view_dirty_since
			.is_some_and(|since| now.saturating_duration_since(since) >= VIEW_SAVE_DELAY)
		{
			self.persist();
		}
	}

	fn load_map(&mut self, ctx: &egui::Context) {
		let Some(path) = crate::util::files::pick_image(&tr!("map-open-title")) else { return };
		match ie::OwnedImage::load(&path) {
			Ok(image) => {
				self.image_size = [image.width() as f64, image.height() as f64];
				self.texture = Some(crate::util::files::load_texture(ctx, "map", &image));
				self.status = Status::info(tr!(
					"map-loaded",
					path = path.display().to_string(),
					width = image.width(),
					height = image.height(),
				));
			}
			Err(err) => self.status = Status::error_chain(&err),
		}
	}

	/// Fit the whole map into `size` screen pixels.
	fn fit(&mut self, size: egui::Vec2) {
		let [w, h] = self.image_size;
		if w <= 0.0 || h <= 0.0 {
			return;
		}
		let zoom = (size.x as f64 / w).min(size.y as f64 / h);
		self.state.view.zoom = zoom.clamp(data::map::MIN_ZOOM, data::map::MAX_ZOOM);
		self.state.view.pan_x = (size.x as f64 - w * self.state.view.zoom) / 2.0;
		self.state.view.pan_y = (size.y as f64 - h * self.state.view.zoom) / 2.0;
		self.persist();
	}

	fn ui_controls(&mut self, ui: &mut egui::Ui) {
		let mut changed = false;
		ui.horizontal_wrapped(|ui| {
			if ui.button(tr!("map-open")).clicked() {
				self.load_map(ui.ctx());
			}
			ui.separator();
			ui.radio_value(&mut self.tool, Tool::Scale, tr!("map-tool-scale"));
			ui.radio_value(&mut self.tool, Tool::Path, tr!("map-tool-path"));
			ui.separator();

			ui.label(tr!("map-known-distance"));
			changed |= ui
				.add_enabled(
					!self.state.is_calibrated(),
					egui::DragValue::new(&mut self.state.known_distance).range(0.001..=100_000.0).speed(0.5),
				)
				.changed();
			egui::ComboBox::from_id_salt("map-unit")
				.selected_text(self.state.unit.label())
				.width(50.0)
				.show_ui(ui, |ui| {
					for unit in Unit::ALL {
						changed |= ui.selectable_value(&mut self.state.unit, unit, unit.label()).changed();
					}
				});

			if self.state.is_calibrated() {
				if ui.button(tr!("map-reset-scale")).clicked() {
					self.state.reset_scale();
					self.tool = Tool::Scale;
					changed = true;
				}
			} else if ui.button(tr!("map-calibrate")).clicked() {
				match self.state.calibrate(self.state.known_distance) {
					Ok(upp) => {
						self.tool = Tool::Path;
						self.status = Status::info(scale_text(upp, self.state.unit));
					}
					Err(err) => self.status = Status::error(err),
				}
				changed = true;
			}
		});

		ui.horizontal_wrapped(|ui| {
			if ui.button(tr!("map-undo-point")).clicked() {
				changed |= self.state.undo_path_point().is_some();
			}
			if ui.button(tr!("map-clear-path")).clicked() {
				self.state.clear_path();
				changed = true;
			}
			ui.separator();

			let preset = self.state.travel_preset();
			egui::ComboBox::from_id_salt("map-preset")
				.selected_text(tr!("travel-preset", id = preset.id))
				.show_ui(ui, |ui| {
					for p in TRAVEL_PRESETS {
						let label = tr!(
							"travel-preset-speed",
							preset = tr!("travel-preset", id = p.id),
							speed = p.miles_per_hour.to_string(),
						);
						changed |= ui
							.selectable_value(&mut self.state.travel_preset_id, p.id.to_string(), label)
							.changed();
					}
				});
			ui.label(tr!("map-hours-per-day"));
			changed |= ui
				.add(egui::DragValue::new(&mut self.state.hours_per_day).range(1.0..=24.0))
				.changed();
		});

		ui.horizontal_wrapped(|ui| {
			match self.state.path_distance() {
				Some(distance) => {
					ui.strong(tr!(
						"map-distance",
						distance = format!("{distance:.2}"),
						unit = self.state.unit.label(),
					));
				}
				None => {
					ui.label(tr!("map-path-pixels", pixels = format!("{:.0}", self.state.path_pixel_length())));
				}
			}
			if let Some(eta) = self.state.eta_text() {
				ui.separator();
				ui.strong(tr!("map-travel-time", eta = eta));
			}
			if let Some(upp) = self.state.units_per_pixel {
				ui.separator();
				ui.weak(scale_text(upp, self.state.unit));
			}
		});

		if changed {
			self.persist();
		}
	}

	fn ui_canvas(&mut self, ui: &mut egui::Ui) {
		let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
		let origin = response.rect.min;
		painter.rect_filled(response.rect, 0.0, ui.visuals().extreme_bg_color);

		let Some(texture) = &self.texture else {
			painter.text(
				response.rect.center(),
				egui::Align2::CENTER_CENTER,
				tr!("map-empty"),
				egui::FontId::proportional(16.0),
				ui.visuals().weak_text_color(),
			);
			return;
		};

		let view = self.state.view;
		let top_left = to_pos(view.image_to_screen(Point::new(0.0, 0.0)), origin);
		let bottom_right = to_pos(view.image_to_screen(Point::new(self.image_size[0], self.image_size[1])), origin);
		let uv = egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
		painter.image(texture.id(), egui::Rect::from_min_max(top_left, bottom_right), uv, Color32::WHITE);

		// Zoom around the cursor.
		if let Some(hover) = response.hover_pos() {
			let scroll = ui.input(|i| i.smooth_scroll_delta.y);
			if scroll != 0.0 {
				self.state.view.zoom_at(to_point(hover, origin), (scroll as f64 * 0.002).exp());
				self.view_changed(Instant::now());
			}
		}

		// Pan with the secondary or middle button.
		if response.dragged_by(egui::PointerButton::Secondary) || response.dragged_by(egui::PointerButton::Middle) {
			let delta = response.drag_delta();
			self.state.view.pan_by(delta.x as f64, delta.y as f64);
			self.view_changed(Instant::now());
		}

		if response.clicked()
			&& let Some(pos) = response.interact_pointer_pos()
		{
			let p = self.state.view.screen_to_image(to_point(pos, origin));
			match self.tool {
				Tool::Scale => {
					if !self.state.add_scale_point(p) {
						self.status = Status::info(tr!("map-scale-full"));
					}
				}
				Tool::Path => self.state.add_path_point(p),
			}
			self.persist();
		}
		if response.double_clicked_by(egui::PointerButton::Secondary) {
			self.fit(response.rect.size());
		}

		let view = self.state.view;
		let screen = |p: Point| to_pos(view.image_to_screen(p), origin);

		let scale_color = Color32::from_rgb(240, 150, 40);
		let scale = self.state.scale_pts.iter().map(|&p| screen(p)).collect::<Vec<_>>();
		if let [a, b] = scale.as_slice() {
			painter.line_segment([*a, *b], Stroke::new(2.0, scale_color));
		}
		for p in &scale {
			painter.circle_filled(*p, 5.0, scale_color);
		}

		let path_color = Color32::from_rgb(60, 140, 240);
		let path = self.state.path_pts.iter().map(|&p| screen(p)).collect::<Vec<_>>();
		if path.len() > 1 {
			painter.add(egui::Shape::line(path.clone(), Stroke::new(2.5, path_color)));
		}
		for p in &path {
			painter.circle_stroke(*p, 4.0, Stroke::new(2.0, path_color));
		}
	}
}

impl super::Module for MapMeasurer {
	fn name(&self) -> String {
		tr!("tab-map")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		self.ui_controls(ui);
		ui.status(&self.status);
		ui.small(tr!("map-help"));
		self.ui_canvas(ui);
	}

	fn busy(&self) -> bool {
		self.view_dirty_since.is_some()
	}

	fn tick(&mut self) {
		self.tick_at(Instant::now());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::module::Module;

	fn saved_view(map: &MapMeasurer) -> Option<data::map::View> {
		map.uniform.store.try_load::<MapState>(keys::MAP_MEASURER).unwrap().map(|s| s.view)
	}

	#[test]
	fn view_is_saved_once_settled() {
		let dir = tempfile::tempdir().unwrap();
		let mut map = MapMeasurer::new(crate::UniformData::in_dir(dir.path()));
		assert!(!map.busy());

		let start = Instant::now();
		map.state.view.pan_by(40.0, -10.0);
		map.view_changed(start);
		assert!(map.busy());

		map.tick_at(start + Duration::from_millis(400));
		assert_eq!(saved_view(&map), None);

		// Another pan restarts the delay.
		map.state.view.pan_by(5.0, 0.0);
		map.view_changed(start + Duration::from_millis(600));
		map.tick_at(start + Duration::from_millis(1200));
		assert_eq!(saved_view(&map), None);
		assert!(map.busy());

		map.tick_at(start + Duration::from_millis(1600));
		assert!(!map.busy());
		let view = saved_view(&map).unwrap();
		assert_eq!((view.pan_x, view.pan_y), (45.0, -10.0));
	}

	#[test]
	fn idle_tick_writes_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let mut map = MapMeasurer::new(crate::UniformData::in_dir(dir.path()));
		map.tick_at(Instant::now() + Duration::from_secs(5));
		assert!(!map.uniform.store.contains(keys::MAP_MEASURER));
	}
}
