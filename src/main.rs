//! fast-hicbuild CLI entry point
//!
//! Builds a sparse Hi-C contact matrix from two mate-wise alignment files.

use clap::Parser;
use fast_hicbuild::core::{
    fixed_bins, restriction_bins, BuildConfig, ClassifierConfig, MatrixBuilder, QcContext,
    ValidPairSink,
};
use fast_hicbuild::formats;
use fast_hicbuild::formats::bam::{BamMateStream, ValidPairWriter};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fast-hicbuild")]
#[command(about = "Build a Hi-C contact matrix from paired-end alignments")]
#[command(version)]
struct Cli {
    /// The two alignment files, one per mate, in identical read order
    /// (align with bowtie2/hisat2 --reorder and without mate pairing)
    #[arg(long = "sam-files", num_args = 2, required = true)]
    sam_files: Vec<PathBuf>,

    /// Output file for the matrix triplets
    #[arg(short = 'o', long = "out-file-name", required = true)]
    out_file_name: PathBuf,

    /// Folder for the quality control report
    #[arg(long = "qc-folder")]
    qc_folder: Option<PathBuf>,

    /// BED file(s) of restriction cut sites, one per enzyme; enables
    /// fragment-resolution bins
    #[arg(long = "restriction-cut-file", num_args = 1.., conflicts_with = "bin_size")]
    restriction_cut_file: Vec<PathBuf>,

    /// Bin size in bp for fixed binning
    #[arg(long = "bin-size")]
    bin_size: Option<u64>,

    /// Restriction enzyme recognition sequence(s), e.g. AAGCTT for HindIII
    #[arg(long = "restriction-sequence", num_args = 1..)]
    restriction_sequence: Vec<String>,

    /// Dangling-end sequence(s), one per restriction sequence, e.g. AGCT
    #[arg(long = "dangling-sequence", num_args = 1..)]
    dangling_sequence: Vec<String>,

    /// Minimum fragment length; shorter restriction fragments are merged
    #[arg(long = "min-distance", default_value = "300")]
    min_distance: u64,

    /// Upper bound of the library insert size distribution
    #[arg(long = "max-library-insert-size", default_value = "1000")]
    max_library_insert_size: u64,

    /// Mates below this mapping quality are discarded
    #[arg(long = "min-mapping-quality", default_value = "15")]
    min_mapping_quality: u8,

    /// Worker thread count
    #[arg(short = 't', long, default_value = "4")]
    threads: usize,

    /// Mate pairs per worker batch
    #[arg(long = "input-buffer-size", default_value = "400000")]
    input_buffer_size: usize,

    /// Process only the first --do-test-run-lines pairs
    #[arg(long = "do-test-run")]
    do_test_run: bool,

    /// Pair cap for --do-test-run
    #[arg(long = "do-test-run-lines", default_value = "1000000")]
    do_test_run_lines: u64,

    /// Skip duplicate removal (saves memory on pre-deduplicated input)
    #[arg(long = "skip-duplication-check")]
    skip_duplication_check: bool,

    /// Count self circles as valid contacts instead of discarding them
    #[arg(long = "keep-self-circles")]
    keep_self_circles: bool,

    /// Count self ligations as valid contacts instead of discarding them
    #[arg(long = "keep-self-ligation")]
    keep_self_ligation: bool,

    /// Restrict (and reorder) the matrix to the chromosomes in this file
    #[arg(long = "chromosome-sizes")]
    chromosome_sizes: Option<PathBuf>,

    /// Write the valid pairs as a coordinate-tagged BAM file
    #[arg(long = "out-bam")]
    out_bam: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let stream1 = BamMateStream::open(&cli.sam_files[0])?;
    let stream2 = BamMateStream::open(&cli.sam_files[1])?;

    let chrom_sizes = match &cli.chromosome_sizes {
        Some(path) => {
            let requested = formats::read_chrom_sizes(path)?;
            // fail fast on names absent from the alignment header
            let names: Vec<String> = requested.iter().map(|(chrom, _)| chrom.clone()).collect();
            formats::select_chromosomes(&stream1.chrom_sizes(), &names)?;
            requested
        }
        None => stream1.chrom_sizes(),
    };

    let mut restriction_sites = Vec::new();
    let bins = if !cli.restriction_cut_file.is_empty() {
        restriction_sites = formats::read_restriction_site_files(&cli.restriction_cut_file)?;
        restriction_bins(
            &restriction_sites,
            cli.min_distance,
            cli.max_library_insert_size,
        )
    } else if let Some(bin_size) = cli.bin_size {
        if bin_size == 0 {
            anyhow::bail!("--bin-size must be positive");
        }
        fixed_bins(bin_size, &chrom_sizes)
    } else {
        anyhow::bail!("either --bin-size or --restriction-cut-file is required");
    };

    let classifier = ClassifierConfig::new(
        &cli.restriction_sequence,
        &cli.dangling_sequence,
        cli.max_library_insert_size,
        cli.min_mapping_quality,
        cli.keep_self_circles,
        cli.keep_self_ligation,
    )?;

    let config = BuildConfig {
        classifier,
        threads: cli.threads,
        batch_size: cli.input_buffer_size,
        skip_duplication_check: cli.skip_duplication_check,
        test_run_pairs: cli.do_test_run.then_some(cli.do_test_run_lines),
    };

    let builder = MatrixBuilder::new(bins, chrom_sizes, &restriction_sites, config)?;

    eprintln!(
        "Building matrix from {:?} and {:?} ({} bins)",
        cli.sam_files[0],
        cli.sam_files[1],
        builder.matrix_size()
    );

    let mut pair_writer = match &cli.out_bam {
        Some(path) => Some(ValidPairWriter::create(path, stream1.header())?),
        None => None,
    };
    let sink = pair_writer.as_mut().map(|w| w as &mut dyn ValidPairSink);

    let output = builder.run(stream1, stream2, sink)?;

    formats::write_matrix(&cli.out_file_name, &output.triplets)?;
    let bins_path = cli.out_file_name.with_extension("bins.bed");
    formats::write_bins(&bins_path, &output.bins)?;

    let output_name = cli.out_file_name.to_string_lossy();
    let qc = output.stats.qc_report(&QcContext {
        output_name: &output_name,
        min_distance: cli.min_distance,
        max_insert_size: cli.max_library_insert_size,
        keep_self_ligation: cli.keep_self_ligation,
        restriction_sequences: &builder_restriction_sequences(&cli),
        dangling_patterns: &dangling_patterns(&cli),
    });
    print!("{}", qc);
    if let Some(folder) = &cli.qc_folder {
        let path = formats::write_qc_report(folder, &qc)?;
        eprintln!("QC report written to {:?}", path);
    }

    eprintln!("\n=== Matrix Statistics ===");
    eprintln!("Sequenced pairs: {}", output.stats.total);
    eprintln!("Hi-C contacts:   {}", output.stats.pair_added);
    eprintln!("Matrix size:     {0} x {0}", output.matrix_size);
    eprintln!("Non-zero cells:  {}", output.triplets.len());
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn builder_restriction_sequences(cli: &Cli) -> Vec<String> {
    cli.restriction_sequence
        .iter()
        .map(|s| s.to_ascii_uppercase())
        .collect()
}

fn dangling_patterns(cli: &Cli) -> Vec<fast_hicbuild::core::DanglingPatterns> {
    cli.dangling_sequence
        .iter()
        .map(|s| fast_hicbuild::core::DanglingPatterns::new(s))
        .collect()
}
