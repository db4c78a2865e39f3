mod dice;
pub use dice::Dice;

mod encounter;
pub use encounter::EncounterTracker;

mod generators;
pub use generators::Generators;

mod map;
pub use map::MapMeasurer;

mod statblock;
pub use statblock::StatBlockImport;

mod vault;
pub use vault::MonsterVault;

pub trait Module {
	fn name(&self) -> String;

	fn ui(&mut self, ui: &mut egui::Ui);

	#[allow(unused_variables)]
	fn ui_settings(&mut self, ui: &mut egui::Ui, config: &mut crate::config::Config) -> bool {false}

	/// Whether background work is pending and the UI should keep polling.
	fn busy(&self) -> bool {false}

	fn tick(&mut self) {}
}
