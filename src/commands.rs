use std::error::Error;
use std::fs;
use std::path::Path;

use chisel_area::{ActorId, BlobWorld, ChiselMode, ChiselOperation, WorldSettings, chisel};
use chisel_blob::BlobVersion;
use chisel_blocks::{StateId, StateRegistry};
use chisel_edit::ChangeTracker;
use chisel_geom::{Axis, BitPos, BlockPos, Face};
use chisel_io::{ShareData, WorldDocument};

use crate::config::ChiselConfig;
use crate::{AxisArg, CarveArgs, Cli, Command, ShapeArg, ShareOp, TransformOp, VersionArg};

type CmdResult = Result<(), Box<dyn Error>>;

/// Actor used for edits made from the command line.
const CLI_ACTOR: ActorId = ActorId(1);

impl From<AxisArg> for Axis {
    fn from(a: AxisArg) -> Self {
        match a {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}

impl From<VersionArg> for BlobVersion {
    fn from(v: VersionArg) -> Self {
        match v {
            VersionArg::Legacy => BlobVersion::Legacy,
            VersionArg::Compact => BlobVersion::Compact,
            VersionArg::Paletted => BlobVersion::Paletted,
        }
    }
}

fn block_pos(p: [i64; 3]) -> BlockPos {
    BlockPos::new(p[0], p[1], p[2])
}

struct Session {
    cfg: ChiselConfig,
    registry: std::sync::Arc<StateRegistry>,
    settings: WorldSettings,
}

impl Session {
    fn new(cfg: ChiselConfig) -> Result<Self, Box<dyn Error>> {
        let settings = cfg.world_settings()?;
        let registry = cfg.registry()?;
        Ok(Self {
            cfg,
            registry,
            settings,
        })
    }

    /// Loads a world document; the document's side length wins over the
    /// configured one.
    fn open(&self, path: &Path) -> Result<BlobWorld, Box<dyn Error>> {
        let doc = if path.exists() {
            WorldDocument::load(path)?
        } else {
            log::info!("{} does not exist, starting empty", path.display());
            WorldDocument::empty(self.settings.side)
        };
        let settings = self.cfg.settings_for_side(doc.side)?;
        let mut world = BlobWorld::new(self.registry.clone(), settings)?;
        doc.restore(&mut world)?;
        Ok(world)
    }

    fn save(&self, world: &BlobWorld, path: &Path) -> CmdResult {
        WorldDocument::capture(world).save(path)?;
        log::info!("wrote {} blocks to {}", world.len(), path.display());
        Ok(())
    }

    fn state_name(&self, id: StateId) -> String {
        match self.registry.get(id) {
            Some(t) => t.name.clone(),
            None => format!("#{id}"),
        }
    }
}

pub fn run(cli: Cli) -> CmdResult {
    let session = Session::new(ChiselConfig::load_or_default(&cli.config)?)?;
    match cli.command {
        Command::Inspect { world, block } => inspect(&session, &world, block.map(block_pos)),
        Command::Convert { input, output, to } => {
            let version = match to {
                Some(v) => v.into(),
                None => session.cfg.version()?,
            };
            convert(&session, &input, &output, version)
        }
        Command::Transform {
            input,
            output,
            block,
            op,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            transform(&session, &input, &output, block.map(block_pos), op)
        }
        Command::Carve(args) => carve(&session, args),
        Command::Share { op } => match op {
            ShareOp::Export {
                world,
                from,
                to,
                output,
            } => {
                let w = session.open(&world)?;
                let text = ShareData::capture(&w, block_pos(from), block_pos(to))?.encode()?;
                match output {
                    Some(path) => fs::write(path, text)?,
                    None => println!("{text}"),
                }
                Ok(())
            }
            ShareOp::Import { world, input, at } => {
                let mut w = session.open(&world)?;
                let data = ShareData::decode(&fs::read_to_string(&input)?)?;
                let placed = data.apply(&mut w, block_pos(at))?;
                log::info!("pasted {placed} blocks at {:?}", at);
                session.save(&w, &world)
            }
        },
    }
}

fn face_letters(flags: u8) -> String {
    const LETTERS: [char; 6] = ['D', 'U', 'N', 'S', 'W', 'E'];
    Face::ALL
        .iter()
        .map(|f| {
            if flags & f.bit() != 0 {
                LETTERS[f.index()]
            } else {
                '-'
            }
        })
        .collect()
}

fn inspect(session: &Session, path: &Path, only: Option<BlockPos>) -> CmdResult {
    let world = session.open(path)?;
    let mut blocks: Vec<_> = world
        .containers()
        .filter(|(pos, _)| only.is_none_or(|o| o == **pos))
        .collect();
    blocks.sort_by_key(|(pos, _)| **pos);
    println!("side {} | {} chiseled blocks", world.side(), world.len());
    for (pos, c) in blocks {
        let blob = c.blob().blob();
        println!(
            "{:>4} {:>4} {:>4}  {:<12} bits {:>6}  light {:>2}  opacity {:.2}  faces {}  {:?} ({} bytes)",
            pos.x,
            pos.y,
            pos.z,
            session.state_name(c.primary_state),
            blob.non_air_count(),
            c.light_level,
            c.opacity,
            face_letters(c.side_flags),
            c.blob().version(),
            c.blob().bytes().len(),
        );
    }
    Ok(())
}

fn convert(session: &Session, input: &Path, output: &Path, version: BlobVersion) -> CmdResult {
    let world = session.open(input)?;
    let mut doc = WorldDocument::capture(&world);
    let mut before = 0usize;
    let mut after = 0usize;
    for entry in &mut doc.blocks {
        let Some(c) = world.container(entry.block()) else {
            continue;
        };
        before += c.blob().bytes().len();
        let bytes = c.blob().to_version(version)?;
        after += bytes.len();
        entry.record.versioned = Some(bytes);
    }
    doc.save(output)?;
    log::info!(
        "converted {} blocks to {:?}: {before} -> {after} bytes",
        doc.blocks.len(),
        version
    );
    Ok(())
}

fn transform(
    session: &Session,
    input: &Path,
    output: &Path,
    only: Option<BlockPos>,
    op: TransformOp,
) -> CmdResult {
    let mut world = session.open(input)?;
    let targets: Vec<BlockPos> = match only {
        Some(b) => vec![b],
        None => world.containers().map(|(p, _)| *p).collect(),
    };
    for pos in &targets {
        let Some(c) = world.container(*pos) else {
            log::warn!("no chiseled block at {:?}", pos);
            continue;
        };
        let blob = match op {
            TransformOp::Rotate { axis, times } => c.blob().rotate90(axis.into(), times)?,
            TransformOp::Mirror { axis } => c.blob().mirror(axis.into())?,
        };
        world.insert_container(*pos, blob);
    }
    log::info!("transformed {} blocks", targets.len());
    session.save(&world, output)
}

fn carve(session: &Session, args: CarveArgs) -> CmdResult {
    let mut world = session.open(&args.world)?;
    let mode = match args.shape {
        ShapeArg::Single => ChiselMode::Single,
        ShapeArg::Cube => ChiselMode::Cube { size: args.size },
        ShapeArg::Sphere => ChiselMode::Sphere {
            diameter: args.size,
        },
    };
    let op = match &args.place {
        Some(name) => ChiselOperation::Place(
            session
                .registry
                .id_by_name(name)
                .ok_or_else(|| format!("unknown state `{name}`"))?,
        ),
        None => ChiselOperation::Chisel,
    };
    let mut tracker = ChangeTracker::new(session.cfg.undo.max_depth);
    let target = BitPos::new(args.at[0], args.at[1], args.at[2]);
    let counts = chisel(&mut world, &mut tracker, CLI_ACTOR, mode, op, target, None)?;
    for (state, n) in counts.iter() {
        println!("{:<16} {n}", session.state_name(state));
    }
    println!("{} bits total", counts.total());

    if args.preview {
        if tracker.undo_depth(CLI_ACTOR) > 0 {
            tracker.undo(CLI_ACTOR, &mut world)?;
        }
        log::info!("preview only, {} left unchanged", args.world.display());
        return Ok(());
    }
    session.save(&world, &args.world)
}
