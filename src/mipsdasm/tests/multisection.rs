/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

//! Whole-pipeline tests: text first, then rodata, then migration, the same
//! order a front-end drives the analysis in.

use mipsdasm::{
    addresses::{AddressRange, GpValue, Rom, RomVramRange, Size, Vram},
    analysis::StringGuesserLevel,
    collections::addended_ordered_map::FindSettings,
    config::{Endian, GlobalConfig, GlobalConfigBuilder, GpConfig},
    context::{Context, ContextBuilder, OverlaySegmentBuilder},
    metadata::{OverlayCategoryName, SymbolType},
    migration::FuncRodataPairing,
    parent_segment_info::ParentSegmentInfo,
    rabbitizer::{display_flags::InstructionDisplayFlags, InstructionFlags, IsaVersion},
    sections::{SectionDataSettings, SectionTextSettings},
    symbols::display::{FunctionDisplaySettings, SymDataDisplaySettings},
};

fn big_endian_context(rom: Rom, vram: Vram, size: Size) -> Context {
    let global_config = GlobalConfig::new(Endian::Big);
    ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    )
    .build()
}

fn parent(rom: Rom, vram: Vram) -> ParentSegmentInfo {
    ParentSegmentInfo::new(rom, vram, None)
}

fn text_settings() -> SectionTextSettings {
    SectionTextSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III))
}

#[test]
fn jumptable_detection_and_sizing() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80000100);
    let size = Size::new(0x20000);
    let mut context = big_endian_context(rom, vram, size);

    // lui/addu/lw/jr: the computed-branch shape. The rest of the function
    // holds the cases the table jumps into, ending on a jr $ra.
    let mut text_bytes = vec![
        0x3C, 0x01, 0x80, 0x01, // lui   $at, %hi(jtbl)
        0x00, 0x22, 0x08, 0x21, // addu  $at, $at, $v0
        0x8C, 0x39, 0x00, 0x00, // lw    $t9, %lo(jtbl)($at)
        0x03, 0x20, 0x00, 0x08, // jr    $t9
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    // Filler up to the final return at 0x800001F8.
    while text_bytes.len() < 0xF8 {
        text_bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    }
    text_bytes.extend_from_slice(&[
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ]);

    let section_text = context
        .create_section_text(
            &text_settings(),
            "test".into(),
            &text_bytes,
            rom,
            vram,
            parent(rom, vram),
        )
        .unwrap();
    assert_eq!(section_text.functions().len(), 1);

    // The jumptable symbol comes from the jr pattern.
    let table = context
        .global_segment()
        .find_symbol(Vram::new(0x80010000), FindSettings::new(false))
        .expect("the jr pattern must produce a jumptable symbol");
    assert_eq!(table.sym_type(), Some(SymbolType::Jumptable));

    // Four entries inside the function, then a word that isn't one.
    let rodata_bytes = [
        0x80, 0x00, 0x01, 0x00, // -> function start
        0x80, 0x00, 0x01, 0x14, //
        0x80, 0x00, 0x01, 0x28, //
        0x80, 0x00, 0x01, 0x3C, //
        0x00, 0x00, 0x00, 0x00, // terminates the table
    ];
    let rodata_rom = rom + Size::new(0xF000);
    let rodata_vram = Vram::new(0x80010000);
    let rodata_section = context
        .create_section_rodata(
            &SectionDataSettings::new(None),
            "test_rodata".into(),
            &rodata_bytes,
            rodata_rom,
            rodata_vram,
            parent(rom, vram),
        )
        .unwrap();

    let table = context
        .global_segment()
        .find_symbol(Vram::new(0x80010000), FindSettings::new(false))
        .unwrap();
    assert_eq!(table.autodetected_size(), Some(Size::new(0x10)));

    // Every entry points at a label strictly inside the function.
    for label_vram in [0x80000114, 0x80000128, 0x8000013C] {
        let label = context
            .global_segment()
            .find_symbol(Vram::new(label_vram), FindSettings::new(false))
            .expect("table entries must produce labels");
        assert_eq!(label.sym_type(), Some(SymbolType::JumptableLabel));
        assert_eq!(label.parent_function(), Some(Vram::new(0x80000100)));
    }

    // The table display resolves entries to their labels.
    let rodata_display_settings = SymDataDisplaySettings::new();
    let table_text = rodata_section.data_symbols()[0]
        .display(&context, &rodata_display_settings)
        .unwrap()
        .to_string();
    println!("{}", table_text);
    assert!(table_text.contains("jtbl_80010000"));
    assert!(table_text.contains(".L80000114"));
}

#[test]
fn string_guessing_levels() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80020000);
    let size = Size::new(0x1000);

    let bytes = *b"Hello\0\0\0";

    for (level, expect_string) in [
        (StringGuesserLevel::No, false),
        (StringGuesserLevel::MultipleReferences, true),
    ] {
        let mut context = big_endian_context(rom, vram, size);
        let settings = SectionDataSettings::new(None).with_string_guesser_level(level);

        let section = context
            .create_section_rodata(
                &settings,
                "test_rodata".into(),
                &bytes,
                rom,
                vram,
                parent(rom, vram),
            )
            .unwrap();

        let text = section.data_symbols()[0]
            .display(&context, &SymDataDisplaySettings::new())
            .unwrap()
            .to_string();
        println!("{}", text);

        if expect_string {
            assert!(text.contains(".asciz \"Hello\""));
            assert!(text.contains("STR_80020000"));
        } else {
            assert!(text.contains(".word"));
            assert!(!text.contains(".asciz"));
        }
    }
}

#[test]
fn migration_preserves_rodata_order() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x30000);

    let global_config = GlobalConfig::new(Endian::Big);
    let mut builder = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    );
    // R3 is unreferenced; only its declaration splits it out of R1.
    builder
        .add_user_symbol("R3".into(), Vram::new(0x80020008), None)
        .unwrap();
    let mut context = builder.build();

    let text_bytes = [
        // F1: references R1.
        0x3C, 0x01, 0x80, 0x02, // lui   $at, 0x8002
        0x24, 0x21, 0x00, 0x00, // addiu $at, $at, 0x0
        0x03, 0xE0, 0x00, 0x08, // jr    $ra
        0x00, 0x00, 0x00, 0x00, //  nop
        // F2: references R2.
        0x3C, 0x01, 0x80, 0x02, // lui   $at, 0x8002
        0x24, 0x21, 0x00, 0x10, // addiu $at, $at, 0x10
        0x03, 0xE0, 0x00, 0x08, // jr    $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let section_text = context
        .create_section_text(
            &text_settings(),
            "test".into(),
            &text_bytes,
            rom,
            vram,
            parent(rom, vram),
        )
        .unwrap();
    assert_eq!(section_text.functions().len(), 2);

    let rodata_bytes = [
        0x00, 0x00, 0x00, 0x01, // R1
        0x00, 0x00, 0x00, 0x02, //
        0x00, 0x00, 0x00, 0x03, // R3 (user declared, unreferenced)
        0x00, 0x00, 0x00, 0x04, //
        0x00, 0x00, 0x00, 0x05, // R2
        0x00, 0x00, 0x00, 0x06, //
    ];
    let rodata_rom = rom + Size::new(0x20000);
    let rodata_vram = Vram::new(0x80020000);
    let rodata_section = context
        .create_section_rodata(
            &SectionDataSettings::new(None),
            "test_rodata".into(),
            &rodata_bytes,
            rodata_rom,
            rodata_vram,
            parent(rom, vram),
        )
        .unwrap();
    assert_eq!(rodata_section.data_symbols().len(), 3);

    let pairings = FuncRodataPairing::pair_sections(
        &context,
        Some(&section_text),
        Some(&rodata_section),
    );

    // Expected order: F1 (with R1), R3 alone, F2 (with R2).
    assert_eq!(pairings.len(), 3);
    match &pairings[0] {
        FuncRodataPairing::Pairing {
            function_index,
            rodata_indices,
            late_rodata_indices,
        } => {
            assert_eq!(*function_index, 0);
            assert_eq!(rodata_indices, &[0]);
            assert!(late_rodata_indices.is_empty());
        }
        other => panic!("Expected F1 pairing, got {:?}", other),
    }
    match &pairings[1] {
        FuncRodataPairing::SingleRodata { rodata_index } => assert_eq!(*rodata_index, 1),
        other => panic!("Expected orphaned R3, got {:?}", other),
    }
    match &pairings[2] {
        FuncRodataPairing::Pairing {
            function_index,
            rodata_indices,
            ..
        } => {
            assert_eq!(*function_index, 1);
            assert_eq!(rodata_indices, &[2]);
        }
        other => panic!("Expected F2 pairing, got {:?}", other),
    }

    // And the rendered plan keeps that order.
    let function_display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    let rodata_display_settings = SymDataDisplaySettings::new();
    let mut output = String::new();
    for pairing in &pairings {
        let display = pairing
            .display(
                &context,
                Some(&section_text),
                &function_display_settings,
                Some(&rodata_section),
                &rodata_display_settings,
                Some(".section .text".into()),
                Some(".section .rodata".into()),
                Some(".section .late_rodata".into()),
            )
            .unwrap();
        output.push_str(&display.to_string());
    }
    println!("{}", output);

    let func1_at = output.find("func_80000000").unwrap();
    let r1_at = output.find("RO_80020000").unwrap();
    let r3_at = output.find("R3").unwrap();
    let func2_at = output.find("func_80000010").unwrap();
    let r2_at = output.find("RO_80020010").unwrap();
    assert!(func1_at < r1_at);
    assert!(r1_at < r3_at);
    assert!(r3_at < func2_at);
    assert!(func2_at < r2_at);
}

#[test]
fn little_endian_double_in_rodata() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80020000);
    let size = Size::new(0x1000);

    let global_config = GlobalConfig::new(Endian::Little);
    let mut builder = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    );
    builder
        .add_user_symbol(
            "DBL_80020000".into(),
            Vram::new(0x80020000),
            Some(SymbolType::Float64),
        )
        .unwrap();
    let mut context = builder.build();

    let bytes = 3.14f64.to_bits().to_le_bytes();

    let section = context
        .create_section_rodata(
            &SectionDataSettings::new(None),
            "test_rodata".into(),
            &bytes,
            rom,
            vram,
            parent(rom, vram),
        )
        .unwrap();

    let text = section.data_symbols()[0]
        .display(&context, &SymDataDisplaySettings::new())
        .unwrap()
        .to_string();
    println!("{}", text);
    assert!(text.contains(".double 3.14"));
}

#[test]
fn overlay_symbols_live_on_their_own_segment() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x10000);

    let global_config = GlobalConfig::new(Endian::Big);
    let mut builder = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    );

    let category = OverlayCategoryName::new("actors".into());
    let overlay_ranges = RomVramRange::new(
        AddressRange::new(Rom::new(0x100000), Rom::new(0x101000)),
        AddressRange::new(Vram::new(0x90000000), Vram::new(0x90001000)),
    );
    let mut overlay =
        OverlaySegmentBuilder::new(category.clone(), overlay_ranges, "actor_0".into());
    overlay
        .add_user_symbol("ActorInit".into(), Vram::new(0x90000100), None)
        .unwrap();
    // Out-of-range declarations are rejected instead of silently landing on
    // the wrong segment.
    assert!(overlay
        .add_user_symbol("bogus".into(), Vram::new(0x80000000), None)
        .is_err());
    builder.add_overlay(overlay);

    let context = builder.build();

    let segment = context
        .overlay_segments()
        .get(&category)
        .expect("category should exist")
        .segments()
        .get(&Rom::new(0x100000))
        .expect("segment should be registered by its rom");
    assert_eq!(segment.name(), Some("actor_0"));

    let sym = segment
        .find_symbol(Vram::new(0x90000100), FindSettings::new(false))
        .expect("the overlay symbol should be there");
    assert_eq!(sym.user_declared_name(), Some("ActorInit"));
}

#[test]
fn gp_rel_access_and_the_gp_rel_hack() {
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x10000);

    let global_config = GlobalConfigBuilder::new(Endian::Big)
        .with_gp_config(Some(GpConfig::new_sdata(GpValue::new(0x80008000))))
        .build();
    let mut context = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    )
    .build();

    let bytes = [
        0x8F, 0x82, 0x00, 0x10, // lw $v0, 0x10($gp)
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];

    let section_text = context
        .create_section_text(
            &text_settings(),
            "test".into(),
            &bytes,
            rom,
            vram,
            parent(rom, vram),
        )
        .unwrap();

    let sym = context
        .global_segment()
        .find_symbol(Vram::new(0x80008010), FindSettings::new(false))
        .expect("the %gp_rel access must produce a symbol");
    assert!(sym.is_gp_rel_accessed());

    let plain = section_text.functions()[0]
        .display(
            &context,
            &FunctionDisplaySettings::new(InstructionDisplayFlags::default()),
        )
        .unwrap()
        .to_string();
    println!("{}", plain);
    assert!(plain.contains("%gp_rel(D_80008010)"));

    let hacked = section_text.functions()[0]
        .display(
            &context,
            &FunctionDisplaySettings::new(InstructionDisplayFlags::default())
                .with_gp_rel_hack(true),
        )
        .unwrap()
        .to_string();
    println!("{}", hacked);
    assert!(hacked.contains(".extern D_80008010"));
    assert!(!hacked.contains("%gp_rel"));
    assert!(!hacked.contains("($gp)"));
}
