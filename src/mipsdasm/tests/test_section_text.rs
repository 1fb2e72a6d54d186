/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use mipsdasm::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    collections::addended_ordered_map::FindSettings,
    config::{Endian, GlobalConfig},
    context::ContextBuilder,
    metadata::SymbolType,
    parent_segment_info::ParentSegmentInfo,
    rabbitizer::{display_flags::InstructionDisplayFlags, InstructionFlags, IsaVersion},
    sections::SectionTextSettings,
    symbols::{display::FunctionDisplaySettings, Symbol},
};

#[test]
fn three_functions_with_early_return() {
    let bytes = [
        // 0x80000400
        0x27, 0xBD, 0xFF, 0xE8, // addiu
        0xAF, 0xB0, 0x00, 0x10, // sw
        0xAF, 0xBF, 0x00, 0x14, // sw
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x00, 0x80, 0x80, 0x21, //  addu
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x02, 0x00, 0x20, 0x21, //  addu
        0x3C, 0x03, 0x80, 0x1A, // lui
        0x8C, 0x63, 0x6D, 0x7C, // lw
        0x24, 0x02, 0x00, 0x02, // addiu
        0x14, 0x62, 0x00, 0x08, // bne
        0x00, 0x00, 0x00, 0x00, //  nop
        0x0C, 0x00, 0x01, 0x3F, // jal
        0x02, 0x00, 0x20, 0x21, //  addu
        0x8F, 0xBF, 0x00, 0x14, // lw
        0x8F, 0xB0, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        0x8F, 0xBF, 0x00, 0x14, // lw
        0x8F, 0xB0, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        // 0x80000460
        0x27, 0xBD, 0xFF, 0xD0, // addiu
        0x3C, 0x11, 0x80, 0x1C, // lui
        0x8E, 0x31, 0x70, 0xB0, // lw
        0xAF, 0xB1, 0x00, 0x24, // sw
        0xAF, 0xBF, 0x00, 0x28, // sw
        0x0C, 0x02, 0x66, 0x00, // jal
        0xAF, 0xB0, 0x00, 0x20, //  sw
        0x3C, 0x02, 0x80, 0x1C, // lui
        0x8C, 0x42, 0x70, 0xB0, // lw
        0x00, 0x50, 0x10, 0x21, // addu
        0x3C, 0x01, 0x80, 0x1C, // lui
        0xAC, 0x22, 0x70, 0xB0, // sw
        0x8F, 0xBF, 0x00, 0x28, // lw
        0x8F, 0xB1, 0x00, 0x24, // lw
        0x8F, 0xB0, 0x00, 0x20, // lw
        0x27, 0xBD, 0x00, 0x30, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
        // 0x800004A8
        0x27, 0xBD, 0xFF, 0xE8, // addiu
        0xAF, 0xBF, 0x00, 0x10, // sw
        0x3C, 0x01, 0x80, 0x22, // lui
        0xAC, 0x20, 0xAD, 0x28, // sw
        0x0C, 0x01, 0xD2, 0xBB, // jal
        0x00, 0x00, 0x00, 0x00, //  nop
        0x8F, 0xBF, 0x00, 0x10, // lw
        0x27, 0xBD, 0x00, 0x18, // addiu
        0x03, 0xE0, 0x00, 0x08, // jr
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x001050);
    let vram = Vram::new(0x80000400);
    let size = Size::new(0x21FC00);

    let text_settings =
        SectionTextSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let global_config = GlobalConfig::new(Endian::Big);
    let mut context = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    )
    .build();

    let section_text = context
        .create_section_text(
            &text_settings,
            "test".into(),
            &bytes,
            rom,
            vram,
            ParentSegmentInfo::new(rom, vram, None),
        )
        .unwrap();

    assert_eq!(section_text.functions().len(), 3);

    let function_display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    for func in section_text.functions() {
        let func_display = func.display(&context, &function_display_settings).unwrap();
        println!("{}", func_display);
    }

    let symbols = context.global_segment().symbols();
    for (sym_vram, sym) in symbols {
        println!("{:?} {:?}", sym_vram, sym.sym_type());
    }

    // 3 own functions, 1 branch label, 3 referenced data addresses and 3
    // unique callees outside the section.
    assert_eq!(symbols.len(), 10);

    // The `bne` target stays a label inside the first function.
    let label = context
        .global_segment()
        .find_symbol(Vram::new(0x8000044C), FindSettings::new(false))
        .expect("branch target should be registered");
    assert_eq!(label.sym_type(), Some(SymbolType::BranchLabel));

    // The early `jr $ra` must not end the first function: a branch reaches
    // past it.
    assert_eq!(
        section_text.functions()[0].vram_range().size(),
        Size::new(0x60)
    );
}

#[test]
fn hi_lo_pair_creates_an_autogenerated_symbol() {
    let bytes = [
        0x3C, 0x01, 0x80, 0x01, // lui   $at, 0x8001
        0x24, 0x21, 0x23, 0x40, // addiu $at, $at, 0x2340
        0x03, 0xE0, 0x00, 0x08, // jr    $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x1000);
    let vram = Vram::new(0x80000000);
    let size = Size::new(0x20000);

    let text_settings =
        SectionTextSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let global_config = GlobalConfig::new(Endian::Big);
    let mut context = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    )
    .build();

    let section_text = context
        .create_section_text(
            &text_settings,
            "test".into(),
            &bytes,
            rom,
            vram,
            ParentSegmentInfo::new(rom, vram, None),
        )
        .unwrap();

    assert_eq!(section_text.functions().len(), 1);

    let sym = context
        .global_segment()
        .find_symbol(Vram::new(0x80012340), FindSettings::new(false))
        .expect("the hi/lo pair must produce a symbol");
    assert_eq!(sym.reference_counter(), 1);
    assert!(sym
        .reference_functions()
        .contains(&Vram::new(0x80000000)));

    let function_display_settings =
        FunctionDisplaySettings::new(InstructionDisplayFlags::default());
    let disassembled = section_text.functions()[0]
        .display(&context, &function_display_settings)
        .unwrap()
        .to_string();
    println!("{}", disassembled);

    assert!(disassembled.contains("%hi(D_80012340)"));
    assert!(disassembled.contains("%lo(D_80012340)"));
}

#[test]
fn leading_nops_are_padding_not_function() {
    let bytes = [
        0x00, 0x00, 0x00, 0x00, // nop
        0x00, 0x00, 0x00, 0x00, // nop
        0x03, 0xE0, 0x00, 0x08, // jr $ra
        0x00, 0x00, 0x00, 0x00, //  nop
    ];
    let rom = Rom::new(0x2000);
    let vram = Vram::new(0x80000100);
    let size = Size::new(0x1000);

    let text_settings =
        SectionTextSettings::new(None, InstructionFlags::new(IsaVersion::MIPS_III));

    let global_config = GlobalConfig::new(Endian::Big);
    let mut context = ContextBuilder::new(
        global_config,
        RomVramRange::new(
            AddressRange::new(rom, rom + size),
            AddressRange::new(vram, vram + size),
        ),
    )
    .build();

    let section_text = context
        .create_section_text(
            &text_settings,
            "test".into(),
            &bytes,
            rom,
            vram,
            ParentSegmentInfo::new(rom, vram, None),
        )
        .unwrap();

    // The nop padding gets its own chunk; the real function starts after.
    assert_eq!(section_text.functions().len(), 2);
    assert_eq!(
        section_text.functions()[1].vram_range().start(),
        Vram::new(0x80000108)
    );
}
