use data::{History, RollMode};
use rand::Rng;

use crate::{UiExt, tr};

const QUICK_DICE: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

fn mode_label(mode: RollMode) -> String {
	match mode {
		RollMode::Normal => tr!("dice-mode-normal"),
		RollMode::Advantage => tr!("dice-mode-advantage"),
		RollMode::Disadvantage => tr!("dice-mode-disadvantage"),
	}
}

pub struct Dice {
	expression: String,
	mode: RollMode,
	last_total: Option<i64>,
	history: History,
}

impl Dice {
	pub fn new() -> Self {
		Self {
			expression: "1d20".to_string(),
			mode: RollMode::Normal,
			last_total: None,
			history: History::default(),
		}
	}

	fn roll(&mut self, expression: &str) {
		let limit = crate::config_read().dice_history_len;
		self.roll_with(expression, &mut rand::thread_rng(), limit);
	}

	fn roll_with(&mut self, expression: &str, rng: &mut impl Rng, history_len: usize) {
		let result = data::dice::roll_with_mode(expression, self.mode, rng);
		match &result {
			Ok(roll) => {
				tracing::debug!(expression, total = roll.total(), "rolled");
				self.last_total = Some(roll.total());
			}
			Err(err) => {
				tracing::debug!(expression, error = %err, "bad dice expression");
				self.last_total = None;
			}
		}
		self.history.push(&result, history_len);
	}

	fn clear_history(&mut self) {
		self.history.entries.clear();
		self.last_total = None;
	}
}

impl super::Module for Dice {
	fn name(&self) -> String {
		tr!("tab-dice")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			let edit = ui.add(egui::TextEdit::singleline(&mut self.expression).hint_text("2d6+3").desired_width(200.0));
			let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
			if ui.button(tr!("dice-roll")).clicked() || submitted {
				let expression = self.expression.clone();
				self.roll(&expression);
			}
		});

		ui.horizontal(|ui| {
			for mode in [RollMode::Normal, RollMode::Advantage, RollMode::Disadvantage] {
				ui.radio_value(&mut self.mode, mode, mode_label(mode));
			}
		});

		ui.horizontal(|ui| {
			for faces in QUICK_DICE {
				if ui.button(format!("d{faces}")).clicked() {
					self.roll(&format!("1d{faces}"));
				}
			}
		});

		if let Some(total) = self.last_total {
			ui.heading(total.to_string());
		}

		ui.spacer();
		ui.horizontal(|ui| {
			ui.label(tr!("dice-history"));
			if ui.small_button(tr!("dice-clear")).clicked() {
				self.clear_history();
			}
		});
		egui::ScrollArea::vertical().show(ui, |ui| {
			for line in &self.history.entries {
				if line.starts_with("Error:") {
					ui.colored_label(ui.visuals().error_fg_color, line);
				} else {
					ui.monospace(line);
				}
			}
		});
	}

	fn ui_settings(&mut self, ui: &mut egui::Ui, config: &mut crate::config::Config) -> bool {
		ui.label(tr!("tab-dice"));
		let changed = ui
			.num_edit_range(&mut config.dice_history_len, &tr!("dice-history-len"), 1..=500)
			.changed();
		if changed {
			self.history.entries.truncate(config.dice_history_len);
		}
		changed
	}
}

#[cfg(test)]
mod tests {
	use rand::{SeedableRng, rngs::StdRng};

	use super::*;

	#[test]
	fn rolls_fill_history_newest_first() {
		let mut dice = Dice::new();
		let mut rng = StdRng::seed_from_u64(7);
		dice.roll_with("5", &mut rng, 2);
		assert_eq!(dice.last_total, Some(5));
		dice.roll_with("2+2", &mut rng, 2);
		dice.roll_with("1d1+9", &mut rng, 2);

		assert_eq!(dice.last_total, Some(10));
		assert_eq!(dice.history.entries.len(), 2);
		assert!(dice.history.entries[0].starts_with("1d1+9"));
	}

	#[test]
	fn bad_expression_clears_total() {
		let mut dice = Dice::new();
		let mut rng = StdRng::seed_from_u64(7);
		dice.roll_with("7", &mut rng, 10);
		dice.roll_with("2d6+x", &mut rng, 10);

		assert_eq!(dice.last_total, None);
		assert!(dice.history.entries[0].starts_with("Error:"));

		dice.clear_history();
		assert!(dice.history.entries.is_empty());
	}

	#[test]
	fn advantage_rolls_are_labelled() {
		let mut dice = Dice::new();
		dice.mode = RollMode::Advantage;
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..20 {
			dice.roll_with("1d20", &mut rng, 5);
			let total = dice.last_total.unwrap();
			assert!((1..=20).contains(&total));
		}
		assert!(dice.history.entries[0].contains("Advantage"));
	}
}
