//! Tank Duel entry point
//!
//! Native demo: generates a battlefield, lets two AI tanks trade shots and
//! logs the event stream. Set `RUST_LOG=debug` for bounces and retargets.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;
    use tank_duel::consts::SIM_DT;
    use tank_duel::sim::{self, Battlefield, GameEvent, WeaponType};
    use tank_duel::{Result, Settings};

    /// Turns played before the duel is called a draw
    const MAX_TURNS: usize = 40;

    #[derive(Debug, Parser)]
    #[command(name = "tank-duel")]
    #[command(about = "AI-vs-AI artillery duel on a generated battlefield")]
    #[command(version)]
    pub(crate) struct Args {
        /// Battlefield seed (overrides the settings file; random when absent)
        #[arg(long)]
        pub(crate) seed: Option<u64>,

        /// Settings JSON file to load
        #[arg(long)]
        pub(crate) settings: Option<PathBuf>,
    }

    fn load_settings(args: &Args) -> Result<Settings> {
        match &args.settings {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                let settings = Settings::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    fn report(event: &GameEvent) {
        match event {
            GameEvent::ProjectileMoved { .. } => log::trace!("{:?}", event),
            GameEvent::Damage(outcome) => {
                for hit in &outcome.hits {
                    log::info!(
                        "  tank {} took {:.0} ({:.0} shield) {:?}",
                        hit.tank_id,
                        hit.total(),
                        hit.shield_damage,
                        hit.kind
                    );
                }
                for earning in &outcome.earnings {
                    log::debug!(
                        "  tank {} earns {} ({:?})",
                        earning.tank_id,
                        earning.amount,
                        earning.reason
                    );
                }
            }
            other => log::debug!("{:?}", other),
        }
    }

    pub(crate) fn run(args: Args) -> Result<()> {
        let settings = load_settings(&args)?;
        let seed = args.seed.or(settings.seed).unwrap_or_else(rand::random);

        let mut field = Battlefield::generate(&settings, seed, 2)?;
        let mut ai_rng = field.rng_state.next_rng();
        log::info!(
            "Difficulty {}, opening wind {}",
            settings.ai_difficulty.as_str(),
            field.wind
        );

        for turn in 0..MAX_TURNS {
            if field.is_decided() {
                break;
            }
            let index = turn % field.tanks.len();
            let shooter = field.tanks[index].clone();
            if !shooter.is_alive() {
                continue;
            }

            match sim::plan_shot(
                &shooter,
                &field.tanks,
                &field.terrain,
                field.wind,
                settings.ai_difficulty,
                &mut ai_rng,
            ) {
                Some(plan) => {
                    field.tanks[index] = shooter.aimed(plan.angle, plan.power);
                    let weapon = WeaponType::ALL[turn % WeaponType::ALL.len()];
                    let (shot, fired) = sim::fire(&mut field, shooter.id, weapon)?;
                    report(&fired);

                    let summary = sim::resolve_shot(&mut field, shot, SIM_DT);
                    summary.events.iter().for_each(report);
                    log::info!(
                        "Turn {}: {} impact(s) in {:.2}s",
                        turn + 1,
                        summary.impacts.len(),
                        summary.duration
                    );
                }
                None => log::info!("Turn {}: tank {} holds fire", turn + 1, shooter.id),
            }
            field.roll_wind();
        }

        let survivors: Vec<_> = field.living_tanks().collect();
        match survivors.as_slice() {
            [winner] => log::info!(
                "Tank {} wins with {:.0} health (seed {})",
                winner.id,
                winner.health,
                seed
            ),
            [] => log::info!("No survivors (seed {})", seed),
            _ => log::info!("Draw after {} turns (seed {})", MAX_TURNS, seed),
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tank Duel (native) starting...");

    let args = <native::Args as clap::Parser>::parse();
    if let Err(e) = native::run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}


#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on wasm; there is no demo loop there
}
