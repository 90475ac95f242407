//! Command-line driver — renders one card side through the helper.
//!
//! ```text
//! tts-field-helper <note_type_id> <front|back> <card.html> [voices.json]
//! ```
//!
//! 1. Load [`RuntimeConfig`] (defaults on first run) and initialise logging.
//! 2. Open the settings store and activate the helper. `voices.json`, if
//!    given, stands in for the platform's voice list (`[{name, lang}]`).
//! 3. Render the card: new fields are registered and the augmented markup
//!    is printed to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tts_field_helper::{
    addon::{RenderedCard, TtsAddon},
    config::RuntimeConfig,
    scanner::CardSide,
    speech::NullSpeech,
    voices::StaticSurfaceFactory,
};

struct Args {
    note_type_id: String,
    side: CardSide,
    card: PathBuf,
    voices: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let usage = "usage: tts-field-helper <note_type_id> <front|back> <card.html> [voices.json]";

    let (Some(note_type_id), Some(side), Some(card)) = (args.next(), args.next(), args.next())
    else {
        bail!(usage);
    };
    let Some(side) = CardSide::parse(&side) else {
        bail!("unknown card side {side:?}; {usage}");
    };

    Ok(Args {
        note_type_id,
        side,
        card: card.into(),
        voices: args.next().map(PathBuf::from),
    })
}

fn main() -> Result<()> {
    // 1. Runtime config + logging
    let runtime = RuntimeConfig::load().context("loading runtime.toml")?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(runtime.log_filter.as_str()),
    )
    .init();

    let args = parse_args()?;
    let markup = std::fs::read_to_string(&args.card)
        .with_context(|| format!("reading {}", args.card.display()))?;
    let voices = args
        .voices
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        })
        .transpose()?;

    // 2. Tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    let output = rt.block_on(async {
        let addon = TtsAddon::from_runtime(
            &runtime,
            Arc::new(StaticSurfaceFactory::new(voices)),
            Arc::new(NullSpeech),
        )?;
        addon.activate();
        addon.discovery_settled().await;

        // 3. Render
        let card = RenderedCard::new(args.note_type_id, args.side, markup);
        let output = addon.on_card_render(&card);
        addon.deactivate();
        anyhow::Ok(output)
    })?;

    println!("{output}");
    Ok(())
}
