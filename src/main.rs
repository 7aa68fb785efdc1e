//! Skirmish - Real-time combat resolution server
//!
//! Runs a scripted skirmish in one region and logs every notice combat
//! sends to clients.

mod settings;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skirmish_combat::{
    Audience, Creature, CreatureId, CreatureKind, DamageRange, Magazine, Notice, Region, RegionId,
    Skill, SkillId, SkillRank, Timestamp, UseTarget, Vec2, Weapon, WeaponType, World,
};

use crate::settings::ServerSettings;

const ARENA: RegionId = RegionId(1);
const KNIGHT: CreatureId = CreatureId(0x10000000000001);
const ARCHER: CreatureId = CreatureId(0x10000000000002);
const OGRE: CreatureId = CreatureId(0x10010000000001);

/// A scripted client request
#[derive(Debug, Clone, Copy)]
enum Command {
    Prepare(CreatureId, SkillId),
    Ready(CreatureId, SkillId),
    Use(CreatureId, SkillId, UseTarget),
    Complete(CreatureId, SkillId),
    Start(CreatureId, SkillId),
}

impl Command {
    fn run(self, region: &mut Region) {
        match self {
            Self::Prepare(c, skill) => {
                region.prepare_skill(c, skill);
            }
            Self::Ready(c, skill) => {
                region.ready_skill(c, skill);
            }
            Self::Use(c, skill, target) => {
                let result = region.use_skill(c, skill, target);
                debug!("{} used {}: {:?}", c, skill.name(), result);
            }
            Self::Complete(c, skill) => {
                region.complete_skill(c, skill);
            }
            Self::Start(c, skill) => {
                region.start_skill(c, skill);
            }
        }
    }
}

/// Requests sent during the demo, by time in milliseconds
fn script() -> Vec<(u64, Command)> {
    use Command::*;
    let ogre = UseTarget::Entity(OGRE);
    let knight = UseTarget::Entity(KNIGHT);
    vec![
        (0, Start(OGRE, SkillId::ManaShield)),
        (200, Prepare(ARCHER, SkillId::MagnumShot)),
        (500, Use(KNIGHT, SkillId::CombatMastery, ogre)),
        (1500, Prepare(OGRE, SkillId::Counterattack)),
        (3000, Ready(OGRE, SkillId::Counterattack)),
        (2200, Ready(ARCHER, SkillId::MagnumShot)),
        (3500, Use(KNIGHT, SkillId::CombatMastery, ogre)),
        (4500, Prepare(KNIGHT, SkillId::Smash)),
        (5500, Ready(KNIGHT, SkillId::Smash)),
        (6000, Use(ARCHER, SkillId::MagnumShot, ogre)),
        (6500, Complete(ARCHER, SkillId::MagnumShot)),
        (7000, Use(KNIGHT, SkillId::Smash, ogre)),
        (7500, Complete(KNIGHT, SkillId::Smash)),
        (9000, Use(OGRE, SkillId::CombatMastery, knight)),
        (10_000, Prepare(KNIGHT, SkillId::Windmill)),
        (11_000, Ready(KNIGHT, SkillId::Windmill)),
        (12_000, Use(KNIGHT, SkillId::Windmill, UseTarget::Area(0))),
        (12_500, Complete(KNIGHT, SkillId::Windmill)),
        (14_000, Use(KNIGHT, SkillId::CombatMastery, ogre)),
        (16_000, Use(ARCHER, SkillId::CombatMastery, ogre)),
    ]
}

fn knight() -> Result<Creature> {
    let mut c = Creature::new(KNIGHT, "Knight", CreatureKind::Player)
        .with_vitals(180.0, 40.0, 80.0)
        .at(Vec2::new(0.0, 0.0));
    c.stats.bare_hand = DamageRange::new(8.0, 14.0);
    c.equipment
        .equip_right(Weapon::new("Broadsword", WeaponType::Sword, DamageRange::new(15.0, 30.0)))
        .context("Knight can't hold a sword")?;
    for (skill, rank) in [
        (SkillId::CombatMastery, SkillRank::R1),
        (SkillId::Smash, SkillRank::R5),
        (SkillId::Windmill, SkillRank::R9),
        (SkillId::Defense, SkillRank::RA),
        (SkillId::CriticalHit, SkillRank::R7),
    ] {
        c.skills.add(Skill::new(skill, rank));
    }
    Ok(c)
}

fn archer() -> Result<Creature> {
    let mut c = Creature::new(ARCHER, "Archer", CreatureKind::Player)
        .with_vitals(120.0, 60.0, 70.0)
        .at(Vec2::new(-600.0, 200.0));
    c.equipment
        .equip_right(Weapon::new("Longbow", WeaponType::Bow, DamageRange::new(20.0, 34.0)))
        .context("Archer can't hold a bow")?;
    c.equipment.load(Magazine {
        name: "Arrows".to_string(),
        count: 100,
    });
    c.skills.add(Skill::new(SkillId::CombatMastery, SkillRank::R5));
    c.skills.add(Skill::new(SkillId::MagnumShot, SkillRank::R5));
    Ok(c)
}

fn ogre() -> Creature {
    let mut c = Creature::new(OGRE, "Ogre", CreatureKind::Npc)
        .with_vitals(600.0, 60.0, 200.0)
        .at(Vec2::new(90.0, 0.0));
    c.stats.bare_hand = DamageRange::new(20.0, 40.0);
    c.stats.protection = 4.0;
    c.stats.defense = 6.0;
    for (skill, rank) in [
        (SkillId::CombatMastery, SkillRank::R9),
        (SkillId::Counterattack, SkillRank::R9),
        (SkillId::ManaShield, SkillRank::RD),
    ] {
        c.skills.add(Skill::new(skill, rank));
    }
    c
}

fn log_notice(audience: Audience, notice: &Notice, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&(audience, notice))?);
        return Ok(());
    }
    match notice {
        Notice::CombatAction(pack) => {
            info!(
                "pack {} ({}): {:?} -> {} target(s)",
                pack.id.0,
                pack.skill_id.name(),
                pack.attacker.core.action_type,
                pack.targets.len()
            );
            for target in &pack.targets {
                info!(
                    "  {} {:?}: {:.1} damage, {:.1} mana, stun {}ms",
                    target.core.creature_id,
                    target.core.action_type,
                    target.damage,
                    target.mana_damage,
                    target.core.stun
                );
            }
        }
        Notice::Text { creature, message } => info!("{} hears \"{}\"", creature, message),
        other => debug!("{:?} <- {:?}", audience, other),
    }
    Ok(())
}

fn main() -> Result<()> {
    let settings = ServerSettings::load();

    // Initialize logging, RUST_LOG wins over the settings file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(settings.logging.with_target)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Skirmish...");
    if let Some(path) = ServerSettings::settings_path().filter(|p| !p.exists()) {
        match settings.save() {
            Ok(()) => info!("Wrote default settings to {:?}", path),
            Err(e) => warn!("Could not write default settings: {}", e),
        }
    }

    let mut world = World::new(settings.combat.clone());
    let region = world.create_region(ARENA);
    {
        let mut region = region.lock();
        region.spawn(knight()?)?;
        region.spawn(archer()?)?;
        region.spawn(ogre())?;
        region.add_fire_source(Vec2::new(-650.0, 150.0));
    }

    let mut script = script();
    script.sort_by_key(|(at, _)| *at);
    let mut pending = script.into_iter().peekable();

    let tick = settings.arena.tick_ms.max(1);
    let mut now = 0;
    while now <= settings.arena.duration_ms {
        world.tick_all(Timestamp(now));

        let notices = world
            .with_region(ARENA, |region| {
                while let Some((_, command)) = pending.next_if(|(at, _)| *at <= now) {
                    command.run(region);
                }
                region.drain_notices()
            })
            .unwrap_or_default();
        for (audience, notice) in &notices {
            log_notice(*audience, notice, settings.arena.json_notices)?;
        }

        let ogre_down = world
            .with_region(ARENA, |region| region.creature(OGRE).map_or(true, |c| c.is_dead()))
            .unwrap_or(true);
        if ogre_down {
            info!("The ogre falls at {}ms", now);
            break;
        }
        now += tick;
    }

    world.with_region(ARENA, |region| {
        for creature in region.creatures().iter() {
            info!(
                "{}: {:.0}/{:.0} life, {:.0} mana",
                creature.name, creature.life, creature.life_max, creature.mana
            );
        }
    });
    info!("Skirmish finished");
    Ok(())
}
