use std::sync::LazyLock;

use i18n_embed::{
	fluent::{fluent_language_loader, FluentLanguageLoader},
	DesktopLanguageRequester,
};
use rust_embed::RustEmbed;
use unic_langid::LanguageIdentifier;

#[derive(RustEmbed)]
#[folder = "i18n"]
struct Localizations;

static LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
	let loader = fluent_language_loader!();
	// egui draws the bidi isolation marks as boxes.
	loader.set_use_isolating(false);
	loader
});

/// Access the global language loader (used by `tr!()`).
pub fn loader() -> &'static FluentLanguageLoader {
	&LOADER
}

/// Initialize localization. A `forced_locale` is preferred over the system locale.
pub fn init(forced_locale: Option<&str>) {
	let requested = match forced_locale.filter(|tag| !tag.trim().is_empty()) {
		Some(tag) => tag.trim().parse::<LanguageIdentifier>().ok().into_iter().collect::<Vec<_>>(),
		None => DesktopLanguageRequester::requested_languages(),
	};

	// Selection failures leave the built-in fallback locale active.
	if let Err(err) = i18n_embed::select(loader(), &Localizations, &requested) {
		tracing::warn!(error = %err, "locale selection failed; using fallback");
	}
}

/// (Re)select a locale at runtime.
pub fn set_locale(tag: Option<&str>) {
	init(tag);
}

#[macro_export]
macro_rules! tr {
	($id:literal $(, $name:ident = $value:expr )* $(,)?) => {
		i18n_embed_fl::fl!($crate::i18n::loader(), $id $(, $name = $value )* )
	};
}

#[cfg(test)]
mod tests {
	#[test]
	fn module_messages_format() {
		super::init(Some("en"));
		assert_eq!(crate::tr!("encounter-round", round = 3), "Round 3");
		assert_eq!(crate::tr!("combatant-role", role = "enemy"), "Enemy");
		assert_eq!(crate::tr!("travel-preset", id = "cart"), "Cart or wagon");
		assert_eq!(
			crate::tr!("generator-saved-list", count = 2, duplicates = 1),
			"Saved 2 items, 1 duplicates removed"
		);
		assert_eq!(crate::tr!("status-error", message = "boom"), "Error: boom");
	}
}
