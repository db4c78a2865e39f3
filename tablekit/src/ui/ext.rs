use std::hash::Hash;
use std::ops::RangeInclusive;

/// Inline feedback of the last action a panel performed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Status {
	#[default]
	Idle,
	Info(String),
	Error(String),
}

impl Status {
	pub fn info(message: impl Into<String>) -> Self {
		Self::Info(message.into())
	}

	pub fn error(err: impl std::fmt::Display) -> Self {
		Self::Error(crate::tr!("status-error", message = err.to_string()))
	}

	/// Error text for an `anyhow` chain, causes included.
	pub fn error_chain(err: &anyhow::Error) -> Self {
		Self::Error(crate::tr!("status-error", message = format!("{err:#}")))
	}
}

pub trait UiExt {
	fn spacer(&mut self);

	fn num_edit_range<N: egui::emath::Numeric>(
		&mut self,
		value: &mut N,
		label: &str,
		range: RangeInclusive<N>,
	) -> egui::Response;

	/// Two-step button for destructive actions. Returns true once confirmed.
	fn confirm_button(&mut self, id_salt: impl Hash, label: &str) -> bool;

	fn status(&mut self, status: &Status);
}

impl UiExt for egui::Ui {
	fn spacer(&mut self) {
		self.add_space(8.0);
	}

	fn num_edit_range<N: egui::emath::Numeric>(
		&mut self,
		value: &mut N,
		label: &str,
		range: RangeInclusive<N>,
	) -> egui::Response {
		self.horizontal(|ui| {
			let response = ui.add(egui::DragValue::new(value).range(range).speed(0.1));
			ui.label(label);
			response
		})
		.inner
	}

	fn confirm_button(&mut self, id_salt: impl Hash, label: &str) -> bool {
		let id = self.id().with(("confirm", id_salt));
		let armed = self.data(|d| d.get_temp::<bool>(id)).unwrap_or(false);
		if !armed {
			if self.button(label).clicked() {
				self.data_mut(|d| d.insert_temp(id, true));
			}
			return false;
		}

		let warn = self.visuals().warn_fg_color;
		let confirmed = self
			.button(egui::RichText::new(crate::tr!("confirm-action", action = label)).color(warn))
			.clicked();
		let cancelled = self.small_button("✕").clicked();
		if confirmed || cancelled {
			self.data_mut(|d| d.remove::<bool>(id));
		}
		confirmed
	}

	fn status(&mut self, status: &Status) {
		match status {
			Status::Idle => {}
			Status::Info(text) => {
				self.label(text);
			}
			Status::Error(text) => {
				let color = self.visuals().error_fg_color;
				self.colored_label(color, text);
			}
		}
	}
}
