//! Map measuring: two-point scale calibration, route length and travel time.
//!
//! Every point is stored in image pixel space. The [`View`] is only a pan and
//! zoom transform used to place those points on screen.

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
	#[default]
	Mi,
	Km,
	Ft,
	M,
}

impl Unit {
	pub const ALL: [Unit; 4] = [Unit::Mi, Unit::Km, Unit::Ft, Unit::M];

	pub fn label(self) -> &'static str {
		match self {
			Unit::Mi => "mi",
			Unit::Km => "km",
			Unit::Ft => "ft",
			Unit::M => "m",
		}
	}

	/// How many of this unit make up one mile.
	pub fn per_mile(self) -> f64 {
		match self {
			Unit::Mi => 1.0,
			Unit::Km => 1.609_344,
			Unit::Ft => 5280.0,
			Unit::M => 1609.344,
		}
	}
}

impl std::fmt::Display for Unit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelPreset {
	pub id: &'static str,
	pub label: &'static str,
	pub miles_per_hour: f64,
}

impl TravelPreset {
	pub fn speed_in(&self, unit: Unit) -> f64 {
		self.miles_per_hour * unit.per_mile()
	}
}

pub const TRAVEL_PRESETS: &[TravelPreset] = &[
	TravelPreset { id: "foot-slow", label: "On foot (slow)", miles_per_hour: 2.0 },
	TravelPreset { id: "foot-normal", label: "On foot (normal)", miles_per_hour: 3.0 },
	TravelPreset { id: "foot-fast", label: "On foot (fast)", miles_per_hour: 4.0 },
	TravelPreset { id: "cart", label: "Cart or wagon", miles_per_hour: 2.0 },
	TravelPreset { id: "horse", label: "Riding horse", miles_per_hour: 6.0 },
	TravelPreset { id: "sailing-ship", label: "Sailing ship", miles_per_hour: 2.0 },
	TravelPreset { id: "galley", label: "Galley", miles_per_hour: 4.0 },
	TravelPreset { id: "airship", label: "Airship", miles_per_hour: 8.0 },
];

pub const DEFAULT_PRESET: &str = "foot-normal";

pub fn travel_preset(id: &str) -> Option<&'static TravelPreset> {
	TRAVEL_PRESETS.iter().find(|p| p.id == id)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
	#[error("two scale points are needed, {0} placed")]
	MissingPoints(usize),
	#[error("scale points coincide")]
	CoincidentPoints,
	#[error("known distance must be positive, got {0}")]
	NonPositiveDistance(f64),
}

/// Uniform zoom followed by a pan, both in screen pixels.
///
/// Loading clamps the zoom to `MIN_ZOOM..=MAX_ZOOM`, so it is never zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", from = "StoredView")]
pub struct View {
	pub zoom: f64,
	pub pan_x: f64,
	pub pan_y: f64,
}

impl Default for View {
	fn default() -> Self {
		Self { zoom: 1.0, pan_x: 0.0, pan_y: 0.0 }
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredView {
	zoom: f64,
	pan_x: f64,
	pan_y: f64,
}

impl Default for StoredView {
	fn default() -> Self {
		let View { zoom, pan_x, pan_y } = View::default();
		Self { zoom, pan_x, pan_y }
	}
}

impl From<StoredView> for View {
	fn from(v: StoredView) -> Self {
		let finite_or = |x: f64, fallback: f64| if x.is_finite() { x } else { fallback };
		Self {
			zoom: finite_or(v.zoom, 1.0).clamp(MIN_ZOOM, MAX_ZOOM),
			pan_x: finite_or(v.pan_x, 0.0),
			pan_y: finite_or(v.pan_y, 0.0),
		}
	}
}

impl View {
	pub fn image_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.zoom + self.pan_x, p.y * self.zoom + self.pan_y)
	}

	pub fn screen_to_image(&self, p: Point) -> Point {
		Point::new((p.x - self.pan_x) / self.zoom, (p.y - self.pan_y) / self.zoom)
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.pan_x += dx;
		self.pan_y += dy;
	}

	/// Scale the zoom by `factor` while keeping the image point under `cursor` in place.
	pub fn zoom_at(&mut self, cursor: Point, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		let anchor = self.screen_to_image(cursor);
		self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		self.pan_x = cursor.x - anchor.x * self.zoom;
		self.pan_y = cursor.y - anchor.y * self.zoom;
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MapState {
	pub unit: Unit,
	pub known_distance: f64,
	pub units_per_pixel: Option<f64>,
	pub scale_pts: Vec<Point>,
	pub path_pts: Vec<Point>,
	pub travel_preset_id: String,
	pub hours_per_day: f64,
	pub view: View,
}

impl Default for MapState {
	fn default() -> Self {
		Self {
			unit: Unit::default(),
			known_distance: 1.0,
			units_per_pixel: None,
			scale_pts: Vec::new(),
			path_pts: Vec::new(),
			travel_preset_id: DEFAULT_PRESET.to_string(),
			hours_per_day: 8.0,
			view: View::default(),
		}
	}
}

impl MapState {
	pub fn is_calibrated(&self) -> bool {
		self.units_per_pixel.is_some()
	}

	/// Place a scale point. Returns false once two are placed or the scale is locked.
	pub fn add_scale_point(&mut self, p: Point) -> bool {
		if self.is_calibrated() || self.scale_pts.len() >= 2 {
			return false;
		}
		self.scale_pts.push(p);
		true
	}

	pub fn calibrate(&mut self, known_distance: f64) -> Result<f64, CalibrationError> {
		let &[a, b] = self.scale_pts.as_slice() else {
			return Err(CalibrationError::MissingPoints(self.scale_pts.len()));
		};
		if !(known_distance > 0.0 && known_distance.is_finite()) {
			return Err(CalibrationError::NonPositiveDistance(known_distance));
		}
		let pixels = a.distance(b);
		if pixels <= f64::EPSILON {
			return Err(CalibrationError::CoincidentPoints);
		}

		let upp = known_distance / pixels;
		self.known_distance = known_distance;
		self.units_per_pixel = Some(upp);
		tracing::debug!(pixels, known_distance, units_per_pixel = upp, "map scale calibrated");
		Ok(upp)
	}

	pub fn reset_scale(&mut self) {
		self.scale_pts.clear();
		self.units_per_pixel = None;
	}

	pub fn add_path_point(&mut self, p: Point) {
		self.path_pts.push(p);
	}

	pub fn undo_path_point(&mut self) -> Option<Point> {
		self.path_pts.pop()
	}

	pub fn clear_path(&mut self) {
		self.path_pts.clear();
	}

	pub fn path_pixel_length(&self) -> f64 {
		self.path_pts.windows(2).map(|w| w[0].distance(w[1])).sum()
	}

	/// Route length in [`MapState::unit`], `None` until calibrated.
	pub fn path_distance(&self) -> Option<f64> {
		self.units_per_pixel.map(|upp| self.path_pixel_length() * upp)
	}

	pub fn travel_preset(&self) -> &'static TravelPreset {
		travel_preset(&self.travel_preset_id)
			.or_else(|| travel_preset(DEFAULT_PRESET))
			.unwrap_or(&TRAVEL_PRESETS[0])
	}

	/// Hours of travel for the current route at the selected preset.
	pub fn eta_hours(&self) -> Option<f64> {
		let distance = self.path_distance()?;
		eta_hours(distance, self.travel_preset().speed_in(self.unit))
	}

	pub fn eta_text(&self) -> Option<String> {
		self.eta_hours().map(|h| format_eta(h, self.hours_per_day))
	}
}

pub fn eta_hours(distance: f64, speed_per_hour: f64) -> Option<f64> {
	(speed_per_hour > 0.0).then(|| distance / speed_per_hour)
}

/// Split travel hours into whole travel days and remaining hours.
///
/// Hours are rounded to the displayed tenth first, so a total that rounds up
/// to a full day is shown as that day.
pub fn format_eta(hours: f64, hours_per_day: f64) -> String {
	let per_day = if hours_per_day > 0.0 { hours_per_day } else { 24.0 };
	let hours = (hours.max(0.0) * 10.0).round() / 10.0;
	let days = ((hours + 1e-9) / per_day).floor();
	let rest = (hours - days * per_day).max(0.0);
	match days as u64 {
		0 => format!("{rest:.1} hours"),
		1 => format!("1 day {rest:.1} hours"),
		n => format!("{n} days {rest:.1} hours"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn calibrated() -> MapState {
		let mut map = MapState::default();
		assert!(map.add_scale_point(Point::new(0.0, 0.0)));
		assert!(map.add_scale_point(Point::new(100.0, 0.0)));
		map.calibrate(50.0).unwrap();
		map
	}

	#[test]
	fn calibration_and_path_distance() {
		let mut map = calibrated();
		assert_eq!(map.units_per_pixel, Some(0.5));

		map.add_path_point(Point::new(0.0, 0.0));
		map.add_path_point(Point::new(120.0, 0.0));
		map.add_path_point(Point::new(120.0, 80.0));
		assert!((map.path_pixel_length() - 200.0).abs() < 1e-9);
		assert!((map.path_distance().unwrap() - 100.0).abs() < 1e-9);
	}

	#[test]
	fn scale_is_locked_until_reset() {
		let mut map = calibrated();
		assert!(!map.add_scale_point(Point::new(5.0, 5.0)));
		assert_eq!(map.scale_pts.len(), 2);

		map.reset_scale();
		assert!(!map.is_calibrated());
		assert!(map.add_scale_point(Point::new(5.0, 5.0)));
	}

	#[test]
	fn calibration_errors() {
		let mut map = MapState::default();
		assert_eq!(map.calibrate(10.0), Err(CalibrationError::MissingPoints(0)));

		map.add_scale_point(Point::new(3.0, 3.0));
		map.add_scale_point(Point::new(3.0, 3.0));
		assert_eq!(map.calibrate(10.0), Err(CalibrationError::CoincidentPoints));

		map.reset_scale();
		map.add_scale_point(Point::new(0.0, 0.0));
		map.add_scale_point(Point::new(0.0, 10.0));
		assert_eq!(map.calibrate(0.0), Err(CalibrationError::NonPositiveDistance(0.0)));
		assert!(!map.is_calibrated());
	}

	#[test]
	fn distance_is_none_before_calibration() {
		let mut map = MapState::default();
		map.add_path_point(Point::new(0.0, 0.0));
		map.add_path_point(Point::new(10.0, 0.0));
		assert_eq!(map.path_distance(), None);
		assert_eq!(map.eta_text(), None);
	}

	#[test]
	fn undo_and_clear_path() {
		let mut map = MapState::default();
		map.add_path_point(Point::new(1.0, 1.0));
		map.add_path_point(Point::new(2.0, 2.0));
		assert_eq!(map.undo_path_point(), Some(Point::new(2.0, 2.0)));
		map.clear_path();
		assert!(map.path_pts.is_empty());
		assert_eq!(map.undo_path_point(), None);
	}

	#[test]
	fn eta_uses_preset_speed_in_map_unit() {
		let mut map = calibrated();
		map.add_path_point(Point::new(0.0, 0.0));
		map.add_path_point(Point::new(48.0, 0.0));
		map.travel_preset_id = "foot-normal".into();
		map.hours_per_day = 8.0;
		// 24 mi at 3 mph
		assert_eq!(map.eta_hours(), Some(8.0));
		assert_eq!(map.eta_text().as_deref(), Some("1 day 0.0 hours"));

		map.unit = Unit::Km;
		let kmh = travel_preset("foot-normal").unwrap().speed_in(Unit::Km);
		assert!((map.eta_hours().unwrap() - 24.0 / kmh).abs() < 1e-9);
	}

	#[test]
	fn unknown_preset_falls_back() {
		let map = MapState { travel_preset_id: "teleport".into(), ..Default::default() };
		assert_eq!(map.travel_preset().id, DEFAULT_PRESET);
	}

	#[test]
	fn eta_formatting() {
		assert_eq!(format_eta(52.0, 24.0), "2 days 4.0 hours");
		assert_eq!(format_eta(5.5, 8.0), "5.5 hours");
		assert_eq!(format_eta(10.0, 8.0), "1 day 2.0 hours");
		assert_eq!(format_eta(30.0, 0.0), "1 day 6.0 hours");
	}

	#[test]
	fn eta_rounding_carries_into_days() {
		assert_eq!(format_eta(7.99, 8.0), "1 day 0.0 hours");
		assert_eq!(format_eta(15.96, 8.0), "2 days 0.0 hours");
		assert_eq!(format_eta(7.94, 8.0), "7.9 hours");
		assert_eq!(format_eta(-3.0, 8.0), "0.0 hours");
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut view = View::default();
		view.pan_by(20.0, -10.0);
		let cursor = Point::new(200.0, 150.0);
		let before = view.screen_to_image(cursor);

		view.zoom_at(cursor, 2.5);
		let after = view.screen_to_image(cursor);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);

		let round = view.image_to_screen(after);
		assert!((round.x - cursor.x).abs() < 1e-9);
		assert!((round.y - cursor.y).abs() < 1e-9);
	}

	#[test]
	fn zoom_is_clamped() {
		let mut view = View::default();
		view.zoom_at(Point::default(), 1000.0);
		assert_eq!(view.zoom, MAX_ZOOM);
		view.zoom_at(Point::default(), 0.0001);
		assert_eq!(view.zoom, MIN_ZOOM);
	}

	#[test]
	fn stored_zoom_is_clamped_on_load() {
		let map: MapState = serde_json::from_str(r#"{"view":{"zoom":0,"panX":12,"panY":-4}}"#).unwrap();
		assert_eq!(map.view.zoom, MIN_ZOOM);
		assert_eq!((map.view.pan_x, map.view.pan_y), (12.0, -4.0));
		let p = map.view.screen_to_image(Point::new(22.0, 6.0));
		assert!(p.x.is_finite() && p.y.is_finite());

		let view: View = serde_json::from_str(r#"{"zoom":-2}"#).unwrap();
		assert_eq!(view.zoom, MIN_ZOOM);
		let view: View = serde_json::from_str(r#"{"zoom":500}"#).unwrap();
		assert_eq!(view.zoom, MAX_ZOOM);
		let view: View = serde_json::from_str(r#"{"panX":3}"#).unwrap();
		assert_eq!(view, View { zoom: 1.0, pan_x: 3.0, pan_y: 0.0 });
	}

	#[test]
	fn legacy_state_without_new_fields_loads() {
		let map: MapState = serde_json::from_str(r#"{"unit":"km","knownDistance":5,"scalePts":[{"x":1,"y":2}]}"#).unwrap();
		assert_eq!(map.unit, Unit::Km);
		assert_eq!(map.scale_pts, vec![Point::new(1.0, 2.0)]);
		assert_eq!(map.hours_per_day, 8.0);
		assert_eq!(map.travel_preset_id, DEFAULT_PRESET);
	}
}
