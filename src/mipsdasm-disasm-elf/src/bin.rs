/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use tracing::{info, warn};

use mipsdasm::{
    addresses::{AddressRange, Rom, RomVramRange, Vram},
    analysis::{PascalStringGuesserLevel, StringGuesserLevel},
    config::{Compiler, GlobalConfig, GlobalConfigBuilder, GpConfig},
    context::{Context, ContextBuilder},
    migration::FuncRodataPairing,
    rabbitizer::{display_flags::InstructionDisplayFlags, InstructionFlags, IsaVersion},
    sections::{
        Section, SectionData, SectionDataSettings, SectionNoloadSettings, SectionText,
        SectionTextSettings,
    },
    symbols::display::{
        FunctionDisplaySettings, SymCommonDisplaySettings, SymDataDisplaySettings,
        SymNoloadDisplaySettings,
    },
    parent_segment_info::ParentSegmentInfo,
};

mod dynamic_section;
mod elf_section_type;
mod elf_symbol;
mod mips_abiflags;
mod mips_reginfo;
mod parsed_elf;

use elf_section_type::RawElfSection;
use parsed_elf::ParsedElf;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
#[allow(non_camel_case_types)]
enum ArgCompiler {
    #[clap(aliases = &["ido"])]
    IDO,
    #[clap(aliases = &["kmc"])]
    KMC,
    #[clap(aliases = &["sn64"])]
    SN64,
    #[clap(aliases = &["egcs"])]
    EGCS,
    #[clap(aliases = &["psyq"])]
    PSYQ,
    #[clap(aliases = &["mwccps2"])]
    MWCCPS2,
    #[clap(aliases = &["eegcc"])]
    EEGCC,
}

impl From<ArgCompiler> for Compiler {
    fn from(value: ArgCompiler) -> Self {
        match value {
            ArgCompiler::IDO => Compiler::IDO,
            ArgCompiler::KMC => Compiler::KMC,
            ArgCompiler::SN64 => Compiler::SN64,
            ArgCompiler::EGCS => Compiler::EGCS,
            ArgCompiler::PSYQ => Compiler::PSYQ,
            ArgCompiler::MWCCPS2 => Compiler::MWCCPS2,
            ArgCompiler::EEGCC => Compiler::EEGCC,
        }
    }
}

/// Disassemble a 32-bit MIPS ELF object into assembler-ready source.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    input_path: PathBuf,
    output_dir: PathBuf,

    #[clap(long)]
    compiler: Option<ArgCompiler>,

    /// Emit a `.size name, . - name` directive after each symbol.
    #[clap(long)]
    asm_emit_size_directive: bool,

    /// String guesser aggressiveness for rodata sections (0-4).
    #[clap(long, default_value_t = 2)]
    rodata_string_guesser: u8,

    /// String guesser aggressiveness for data sections (0-4).
    #[clap(long, default_value_t = 0)]
    data_string_guesser: u8,

    /// Pascal string guesser aggressiveness (0-4).
    #[clap(long, default_value_t = 0)]
    pascal_string_guesser: u8,

    /// Append this suffix to every autogenerated symbol name.
    #[clap(long)]
    custom_suffix: Option<String>,

    /// Name branch labels `.L_<function>_<n>` instead of `.L<vram>`.
    #[clap(long)]
    sequential_label_names: bool,

    /// `STR_`/`FLT_`/`DBL_` prefixes for typed data symbols (the default).
    #[clap(long)]
    name_vars_by_type: bool,

    /// Include the file name on autogenerated names.
    #[clap(long)]
    name_vars_by_file: bool,

    /// `RO_`/`B_` prefixes for rodata/bss symbols (the default).
    #[clap(long)]
    name_vars_by_section: bool,

    /// Zero-pad autogenerated names to 6 digits instead of 8.
    #[clap(long)]
    legacy_sym_addr_zero_padding: bool,

    /// Fold duplicated `jr $ra` epilogues into the previous function.
    #[clap(long)]
    detect_redundant_function_end: bool,

    /// Emit the raw `.cpload` instructions instead of the directive.
    #[clap(long)]
    no_emit_cpload: bool,

    /// Spaces of indentation for instructions and data directives.
    #[clap(long, default_value_t = 4)]
    asm_indentation: u8,

    /// Spaces of indentation for labels inside functions.
    #[clap(long, default_value_t = 2)]
    asm_indentation_labels: u8,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap handles --help/--version through this same path.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let parsed = match read_input(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("Input error: {:?}", err);
            return ExitCode::from(2);
        }
    };

    match disassemble(&args, parsed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Analysis error: {:?}", err);
            ExitCode::from(3)
        }
    }
}

fn read_input(args: &Args) -> Result<ParsedElf> {
    let binary_data = fs::read(&args.input_path)
        .with_context(|| format!("Can't read {}", args.input_path.display()))?;
    ParsedElf::parse(&binary_data)
}

fn global_config_from_args(args: &Args, parsed: &ParsedElf) -> GlobalConfig {
    let gp_config = parsed.gp_value.map(|gp_value| {
        if parsed.is_pic {
            GpConfig::new_pic(gp_value)
        } else {
            GpConfig::new_sdata(gp_value)
        }
    });

    let mut builder = GlobalConfigBuilder::new(parsed.endian)
        .apply_env_overrides()
        .with_gp_config(gp_config)
        .with_emit_size_directive(args.asm_emit_size_directive)
        .with_emit_cpload(!args.no_emit_cpload)
        .with_detect_redundant_function_end(args.detect_redundant_function_end)
        .with_asm_indentation(args.asm_indentation)
        .with_asm_indentation_labels(args.asm_indentation_labels);

    let naming = builder.naming_mut();
    // Type/section prefixes are on by default; the flags exist to force
    // them back on over an environment override.
    if args.name_vars_by_type {
        naming.set_name_vars_by_type(true);
    }
    if args.name_vars_by_section {
        naming.set_name_vars_by_section(true);
    }
    if args.name_vars_by_file {
        naming.set_name_vars_by_file(true);
    }
    if args.legacy_sym_addr_zero_padding {
        naming.set_legacy_zero_padding(true);
    }
    if args.sequential_label_names {
        naming.set_sequential_label_names(true);
    }
    if args.custom_suffix.is_some() {
        naming.set_custom_suffix(args.custom_suffix.clone());
    }

    builder.build()
}

// The union of every section's rom/vram spans, aligned down to words.
fn global_ranges(parsed: &ParsedElf) -> Result<RomVramRange> {
    let mut rom_start = u32::MAX;
    let mut rom_end = 0;
    let mut vram_start = u32::MAX;
    let mut vram_end = 0;

    let mut visit = |section: &RawElfSection| {
        if let Some(file_offset) = section.file_offset {
            rom_start = rom_start.min(file_offset);
            rom_end = rom_end.max(file_offset + section.size);
        }
        vram_start = vram_start.min(section.address);
        vram_end = vram_end.max(section.address + section.size);
    };

    for section in parsed
        .executable_sections
        .iter()
        .chain(&parsed.data_sections)
        .chain(&parsed.rodata_sections)
        .chain(&parsed.gcc_except_table_sections)
        .chain(&parsed.nobits_sections)
    {
        visit(section);
    }

    if vram_start >= vram_end {
        bail!("The ELF has no sections worth disassembling");
    }

    rom_start &= !3;
    vram_start &= !3;
    let rom_size = rom_end.saturating_sub(rom_start);
    // The vram span must cover the rom span for the range pairing to hold.
    vram_end = vram_end.max(vram_start + rom_size);

    Ok(RomVramRange::new(
        AddressRange::new(Rom::new(rom_start), Rom::new(rom_end.max(rom_start))),
        AddressRange::new(Vram::new(vram_start), Vram::new(vram_end)),
    ))
}

fn build_context(args: &Args, parsed: &ParsedElf) -> Result<Context> {
    let global_config = global_config_from_args(args, parsed);
    let ranges = global_ranges(parsed)?;

    let mut builder = ContextBuilder::new(global_config, ranges);

    for sym in &parsed.symbols {
        match builder.add_user_symbol(sym.name.clone(), Vram::new(sym.address), sym.sym_type) {
            Ok(metadata) => {
                if let Some(size) = sym.size.and_then(mipsdasm::addresses::UserSize::new_checked)
                {
                    metadata.set_user_declared_size(size);
                }
                if sym.is_weak {
                    metadata.set_visibility("weak".into());
                } else if !sym.is_global {
                    metadata.set_visibility("local".into());
                }
            }
            Err(err) => warn!("Skipping symbol: {}", err),
        }
    }

    for parsed_reloc in &parsed.relocs {
        builder.add_user_reloc(parsed_reloc.rom, parsed_reloc.reloc.clone());
    }

    if let Some(got) = &parsed.got {
        builder.set_global_offset_table(got.clone());
    }

    Ok(builder.build())
}

struct AnalyzedSections {
    text: Vec<SectionText>,
    rodata: Vec<SectionData>,
    data: Vec<SectionData>,
    bss: Vec<(String, mipsdasm::sections::SectionNoload)>,
}

fn analyze(args: &Args, parsed: &ParsedElf, context: &mut Context) -> Result<AnalyzedSections> {
    let compiler = args.compiler.map(Compiler::from);
    let ranges = global_ranges(parsed)?;
    let parent = ParentSegmentInfo::new(
        ranges.rom().start(),
        ranges.vram().start(),
        None,
    );

    // `.MIPS.abiflags` pins the ISA the object was built for; without it we
    // assume mips3, which covers the usual N64 targets.
    let isa_version = parsed
        .abiflags
        .and_then(|x| x.isa_version())
        .unwrap_or(IsaVersion::MIPS_III);
    let text_settings =
        SectionTextSettings::new(compiler, InstructionFlags::new(isa_version));
    let rodata_settings = SectionDataSettings::new(compiler)
        .with_string_guesser_level(StringGuesserLevel::from_level(args.rodata_string_guesser))
        .with_pascal_string_guesser_level(PascalStringGuesserLevel::from_level(
            args.pascal_string_guesser,
        ));
    let data_settings = SectionDataSettings::new(compiler)
        .with_string_guesser_level(StringGuesserLevel::from_level(args.data_string_guesser))
        .with_pascal_string_guesser_level(PascalStringGuesserLevel::from_level(
            args.pascal_string_guesser,
        ))
        .with_guess_floats(false)
        .with_encoding(mipsdasm::str_decoding::Encoding::Ascii);
    let noload_settings = SectionNoloadSettings::new(compiler);

    let mut text = Vec::new();
    // All text first: function extents and labels must exist before rodata
    // resolves jumptables.
    for section in &parsed.executable_sections {
        let Some(file_offset) = section.file_offset else {
            continue;
        };
        info!("Analyzing {}", section.name);
        text.push(context.create_section_text(
            &text_settings,
            section.name.clone(),
            &section.data,
            Rom::new(file_offset),
            Vram::new(section.address),
            parent.clone(),
        )?);
    }

    let mut rodata = Vec::new();
    for section in &parsed.rodata_sections {
        let Some(file_offset) = section.file_offset else {
            continue;
        };
        info!("Analyzing {}", section.name);
        rodata.push(context.create_section_rodata(
            &rodata_settings,
            section.name.clone(),
            &section.data,
            Rom::new(file_offset),
            Vram::new(section.address),
            parent.clone(),
        )?);
    }
    for section in &parsed.gcc_except_table_sections {
        let Some(file_offset) = section.file_offset else {
            continue;
        };
        rodata.push(context.create_section_gcc_except_table(
            &rodata_settings,
            section.name.clone(),
            &section.data,
            Rom::new(file_offset),
            Vram::new(section.address),
            parent.clone(),
        )?);
    }

    let mut data = Vec::new();
    for section in &parsed.data_sections {
        let Some(file_offset) = section.file_offset else {
            continue;
        };
        info!("Analyzing {}", section.name);
        data.push(context.create_section_data(
            &data_settings,
            section.name.clone(),
            &section.data,
            Rom::new(file_offset),
            Vram::new(section.address),
            parent.clone(),
        )?);
    }

    let mut bss = Vec::new();
    for section in &parsed.nobits_sections {
        info!("Analyzing {}", section.name);
        let vram_range = AddressRange::new(
            Vram::new(section.address),
            Vram::new(section.address + section.size),
        );
        bss.push((
            section.name.clone(),
            context.create_section_bss(
                &noload_settings,
                section.name.clone(),
                vram_range,
                parent.clone(),
            )?,
        ));
    }

    Ok(AnalyzedSections {
        text,
        rodata,
        data,
        bss,
    })
}

fn disassemble(args: &Args, parsed: ParsedElf) -> Result<()> {
    let mut context = build_context(args, &parsed)?;
    let sections = analyze(args, &parsed, &mut context)?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Can't create {}", args.output_dir.display()))?;

    let common = SymCommonDisplaySettings::from_config(context.global_config());
    let function_display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default())
            .with_common(common.clone());
    let data_display_settings = SymDataDisplaySettings::new().with_common(common.clone());
    let noload_display_settings = SymNoloadDisplaySettings::new().with_common(common.clone());

    // Text sections get emitted through the migration plan, so each
    // function carries its rodata.
    let rodata_for_migration = sections.rodata.first();
    for text_section in &sections.text {
        let pairings =
            FuncRodataPairing::pair_sections(&context, Some(text_section), rodata_for_migration);

        let path = output_path(args, text_section.name());
        let mut output = BufWriter::new(File::create(&path)?);
        write_file_prologue(&mut output)?;
        writeln!(output, ".section .text")?;
        writeln!(output)?;

        for pairing in &pairings {
            let display = pairing
                .display(
                    &context,
                    Some(text_section),
                    &function_display_settings,
                    rodata_for_migration,
                    &data_display_settings,
                    None,
                    Some(".section .rodata".into()),
                    Some(".section .late_rodata".into()),
                )
                .map_err(|err| anyhow::anyhow!("{}", err))?;
            writeln!(output, "{}", display)?;
        }
        info!("Wrote {}", path.display());
    }

    // Unmigrated rodata would have been covered above; the rest of the data
    // sections are emitted as-is.
    for data_section in sections.rodata.iter().skip(1).chain(&sections.data) {
        let path = output_path(args, data_section.name());
        let mut output = BufWriter::new(File::create(&path)?);
        write_file_prologue(&mut output)?;
        writeln!(output, ".section {}", data_section.name())?;
        writeln!(output)?;

        for sym in data_section.data_symbols() {
            let display = sym
                .display(&context, &data_display_settings)
                .map_err(|err| anyhow::anyhow!("{}", err))?;
            writeln!(output, "{}", display)?;
        }
        info!("Wrote {}", path.display());
    }

    for (name, bss_section) in &sections.bss {
        let path = output_path(args, name);
        let mut output = BufWriter::new(File::create(&path)?);
        write_file_prologue(&mut output)?;
        writeln!(output, ".section {}", name)?;
        writeln!(output)?;

        for sym in bss_section.noload_symbols() {
            let display = sym
                .display(&context, &noload_display_settings)
                .map_err(|err| anyhow::anyhow!("{}", err))?;
            writeln!(output, "{}", display)?;
        }
        info!("Wrote {}", path.display());
    }

    Ok(())
}

fn output_path(args: &Args, section_name: &str) -> PathBuf {
    let clean_name = section_name.trim_start_matches('.').replace('.', "_");
    args.output_dir.join(format!("{}.s", clean_name))
}

fn write_file_prologue(output: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        output,
        "/* Generated by mipsdasm {} */",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(output)?;
    writeln!(output, ".include \"macro.inc\"")?;
    writeln!(output)?;
    writeln!(output, ".set noat")?;
    writeln!(output, ".set noreorder")?;
    writeln!(output)
}
