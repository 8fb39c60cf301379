use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dmaheap_api::dma_heap::{DMA_HEAP_DIR, DmaHeap, HeapConfig, list_heaps};
use log::warn;

mod logger;

#[derive(Parser, Debug)]
#[command(name = "dmaheap", version, about = "Probe and allocate from Linux DMA heaps")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List heap devices
    List {
        /// Directory holding the heap device nodes
        #[arg(long, default_value = DMA_HEAP_DIR)]
        dir: PathBuf,
    },
    /// Report which candidate heap opens
    Probe(HeapArgs),
    /// Allocate a named buffer, print what the kernel reports, then free it
    Alloc {
        #[command(flatten)]
        heap: HeapArgs,

        /// Name attached to the buffer
        #[arg(long, default_value = "dmaheap")]
        name: String,

        /// Requested size in bytes
        #[arg(long)]
        size: usize,
    },
}

#[derive(clap::Args, Debug)]
struct HeapArgs {
    /// Candidate heap device, in priority order. Defaults to the
    /// `linux,cma` heap with `reserved` as fallback.
    #[arg(long = "heap")]
    heaps: Vec<PathBuf>,
}

impl HeapArgs {
    fn config(&self) -> HeapConfig {
        if self.heaps.is_empty() {
            HeapConfig::default()
        } else {
            self.heaps.iter().collect()
        }
    }

    fn open(&self) -> Result<DmaHeap> {
        let config = self.config();
        let heap = DmaHeap::with_config(&config);
        if !heap.is_valid() {
            bail!(
                "no dma heap could be opened (tried: {})",
                config
                    .candidates()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(heap)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.cmd {
        Cmd::List { dir } => {
            let heaps =
                list_heaps(&dir).with_context(|| format!("listing {}", dir.display()))?;
            for heap in heaps {
                println!("{}", heap.display());
            }
        }
        Cmd::Probe(args) => {
            let heap = args.open()?;
            if let Some(path) = heap.path() {
                println!("{}", path.display());
            }
        }
        Cmd::Alloc { heap, name, size } => {
            let heap = heap.open()?;
            let buf = heap
                .allocate(&name, size)
                .with_context(|| format!("allocating {size} bytes as {name:?}"))?;
            println!("requested: {}", buf.len());
            match buf.info() {
                Ok(info) => {
                    println!("heap:      {}", info.exp_name);
                    println!("name:      {}", info.name.as_deref().unwrap_or("-"));
                    println!("size:      {}", info.size);
                }
                Err(e) => warn!("Allocated {:?} but could not read its info: {}", name, e),
            }
        }
    }

    Ok(())
}
