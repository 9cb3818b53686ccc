// src/bin/dipole_lattice.rs
//
// Developer diagnostic: macrocell dipole field on a simple cubic block.
//
// Builds an nx×ny×nz block of cubic macrocells, couples them with a
// point-dipole tensor T_ij = (3 r̂r̂ - I) / r^3 (Å^-3, zero for i = j),
// splits the cells across `ranks` simulated processes, evaluates each rank's
// local cells and merges the results.
//
// Writes:
//   <out>/<run>/config.json
//   <out>/<run>/dipole_fields.csv   (one row per cell)
//
// Usage examples:
//   cargo run --bin dipole_lattice
//   cargo run --bin dipole_lattice -- nx=8 ny=8 nz=1 size=12 ranks=4 par=on
//   RUST_LOG=cell_dipole=debug cargo run --bin dipole_lattice -- config=runs/x/config.json

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cell_dipole::cells::{CellArena, LocalCells};
use cell_dipole::config::RunConfig;
use cell_dipole::effective_field::dipole::{DipoleFieldEvaluator, DipoleUpdate};
use cell_dipole::effective_field::tensor::{InteractionTensorStore, SymTensor3};
use cell_dipole::effective_field::build_b_eff;
use cell_dipole::energy::{demag_energy, dipole_energy};
use cell_dipole::error::DipoleResult;
use cell_dipole::params::MU_B;
use cell_dipole::vec3::norm;
use cell_dipole::vector_field::{CellField, DipoleFields};

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run --bin dipole_lattice -- [config=FILE]
             [nx=N] [ny=N] [nz=N] [size=ANGSTROM] [atoms=N] [moment=MU_B]
             [ranks=N] [par=on|off] [dipole=on|off] [bz=TESLA]
             [out=DIR] [run=RUN_ID]
"#
    );
}

fn parse_on_off(v: &str) -> Option<bool> {
    match v {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_args(args: &[String]) -> DipoleResult<(RunConfig, String)> {
    let mut cfg = RunConfig::default();
    cfg.dipole = cfg.dipole.with_env_overrides();
    let mut out_root = "runs".to_string();

    // config= first so explicit keys override it
    for arg in args {
        if let Some(v) = arg.strip_prefix("config=") {
            cfg = RunConfig::load(&PathBuf::from(v))?;
        }
    }

    for arg in args {
        let ok = if let Some(v) = arg.strip_prefix("nx=") {
            v.parse::<usize>().map(|n| cfg.lattice.nx = n).is_ok()
        } else if let Some(v) = arg.strip_prefix("ny=") {
            v.parse::<usize>().map(|n| cfg.lattice.ny = n).is_ok()
        } else if let Some(v) = arg.strip_prefix("nz=") {
            v.parse::<usize>().map(|n| cfg.lattice.nz = n).is_ok()
        } else if let Some(v) = arg.strip_prefix("size=") {
            v.parse::<f64>().map(|a| cfg.lattice.cell_size = a).is_ok()
        } else if let Some(v) = arg.strip_prefix("atoms=") {
            v.parse::<u32>().map(|n| cfg.lattice.atoms_per_cell = n).is_ok()
        } else if let Some(v) = arg.strip_prefix("moment=") {
            v.parse::<f64>().map(|m| cfg.lattice.moment_per_atom = m).is_ok()
        } else if let Some(v) = arg.strip_prefix("ranks=") {
            v.parse::<usize>().map(|n| cfg.run.n_ranks = n.max(1)).is_ok()
        } else if let Some(v) = arg.strip_prefix("par=") {
            parse_on_off(v).map(|b| cfg.dipole.parallel = b).is_some()
        } else if let Some(v) = arg.strip_prefix("dipole=") {
            parse_on_off(v).map(|b| cfg.dipole.enabled = b).is_some()
        } else if let Some(v) = arg.strip_prefix("bz=") {
            v.parse::<f64>().map(|b| cfg.fields.b_ext[2] = b).is_ok()
        } else if let Some(v) = arg.strip_prefix("out=") {
            out_root = v.to_string();
            true
        } else if let Some(v) = arg.strip_prefix("run=") {
            cfg.run.run_id = v.to_string();
            true
        } else {
            arg.starts_with("config=")
        };

        if !ok {
            warn!(arg = arg.as_str(), "ignoring unrecognised argument");
            print_usage();
        }
    }

    Ok((cfg, out_root))
}

/// Cell centres (Å) of the block, x fastest.
fn cell_centres(cfg: &RunConfig) -> Vec<[f64; 3]> {
    let l = &cfg.lattice;
    let a = l.cell_size;
    let mut out = Vec::with_capacity(l.nx * l.ny * l.nz);
    for k in 0..l.nz {
        for j in 0..l.ny {
            for i in 0..l.nx {
                out.push([
                    (i as f64 + 0.5) * a,
                    (j as f64 + 0.5) * a,
                    (k as f64 + 0.5) * a,
                ]);
            }
        }
    }
    out
}

fn point_dipole_tensor(ri: [f64; 3], rj: [f64; 3]) -> SymTensor3 {
    let r = [rj[0] - ri[0], rj[1] - ri[1], rj[2] - ri[2]];
    let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
    if r2 == 0.0 {
        return SymTensor3::ZERO;
    }
    let rabs = r2.sqrt();
    let inv_r3 = 1.0 / (r2 * rabs);
    let e = [r[0] / rabs, r[1] / rabs, r[2] / rabs];
    SymTensor3::new(
        (3.0 * e[0] * e[0] - 1.0) * inv_r3,
        3.0 * e[0] * e[1] * inv_r3,
        3.0 * e[0] * e[2] * inv_r3,
        (3.0 * e[1] * e[1] - 1.0) * inv_r3,
        3.0 * e[1] * e[2] * inv_r3,
        (3.0 * e[2] * e[2] - 1.0) * inv_r3,
    )
}

/// Contiguous block split of `n` cells over `n_ranks`.
fn block_local_cells(n: usize, n_ranks: usize, rank: usize) -> LocalCells {
    let base = n / n_ranks;
    let rem = n % n_ranks;
    let start = rank * base + rank.min(rem);
    let len = base + usize::from(rank < rem);
    LocalCells::new((start..start + len).collect())
}

fn main() -> DipoleResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cfg, out_root) = parse_args(&args)?;

    let centres = cell_centres(&cfg);
    let n = centres.len();
    let l = &cfg.lattice;
    let dir_n = norm(l.m_dir);
    let moment = l.atoms_per_cell as f64 * l.moment_per_atom * MU_B;
    let m_cell = if dir_n > 0.0 {
        [
            moment * l.m_dir[0] / dir_n,
            moment * l.m_dir[1] / dir_n,
            moment * l.m_dir[2] / dir_n,
        ]
    } else {
        [0.0; 3]
    };

    let cells = CellArena::from_parts(
        vec![m_cell; n],
        vec![l.cell_size.powi(3); n],
        vec![l.atoms_per_cell; n],
    )?;

    info!(
        cells = n,
        ranks = cfg.run.n_ranks.max(1),
        parallel = cfg.dipole.parallel,
        enabled = cfg.dipole.enabled,
        "macrocell block ready"
    );

    let mut merged = DipoleFields::new(n);
    let mut b_eff_all = CellField::new(n);
    let mut e_dip = 0.0;
    let mut e_demag = 0.0;

    let n_ranks = cfg.run.n_ranks.max(1);
    for rank in 0..n_ranks {
        let local = block_local_cells(n, n_ranks, rank);
        let tensor = InteractionTensorStore::from_fn(local.n_local(), n, |lc, j| {
            point_dipole_tensor(centres[local.global(lc)], centres[j])
        });

        let mut params = cfg.dipole;
        params.rank = rank;
        let evaluator = DipoleFieldEvaluator::new(params);

        // Each rank owns its output buffers.
        let mut fields = DipoleFields::new(n);
        let mut b_eff = CellField::new(n);
        let update = build_b_eff(
            &cells,
            &local,
            &tensor,
            &evaluator,
            &mut fields,
            &mut b_eff,
            cfg.fields.b_ext,
        )?;
        if let DipoleUpdate::Updated { cells_updated, cells_empty } = update {
            info!(rank, cells_updated, cells_empty, "rank evaluated");
        }

        e_dip += dipole_energy(&cells, &local, &fields);
        e_demag += demag_energy(&cells, &local, &fields);

        for &i in &local.local_to_global {
            merged.total.data[i] = fields.total.data[i];
            merged.demag_only.data[i] = fields.demag_only.data[i];
            b_eff_all.data[i] = b_eff.data[i];
        }
    }

    let mut avg = [0.0; 3];
    for b in &merged.total.data {
        avg[0] += b[0] / n as f64;
        avg[1] += b[1] / n as f64;
        avg[2] += b[2] / n as f64;
    }
    info!(
        bx = avg[0],
        by = avg[1],
        bz = avg[2],
        e_dipole_j = e_dip,
        e_demag_j = e_demag,
        "average dipolar induction (T)"
    );

    let run_dir = PathBuf::from(&out_root).join(&cfg.run.run_id);
    create_dir_all(&run_dir)?;
    cfg.write_to_dir(&run_dir)?;

    let csv_path = run_dir.join("dipole_fields.csv");
    let mut w = BufWriter::new(File::create(&csv_path)?);
    writeln!(w, "cell,x,y,z,bx,by,bz,bdx,bdy,bdz,beff_x,beff_y,beff_z")?;
    for (i, r) in centres.iter().enumerate() {
        let b = merged.total.data[i];
        let d = merged.demag_only.data[i];
        let e = b_eff_all.data[i];
        writeln!(
            w,
            "{},{},{},{},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e}",
            i, r[0], r[1], r[2], b[0], b[1], b[2], d[0], d[1], d[2], e[0], e[1], e[2]
        )?;
    }
    w.flush()?;
    info!(path = %csv_path.display(), "wrote dipole fields");

    Ok(())
}
