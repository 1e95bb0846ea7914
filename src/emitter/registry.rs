//! Registry → `init-models.ts` emission.

use super::format::IndentWriter;
use super::{association_options, Artifact, EmitConfig};
use crate::registry::RegistryEntry;

/// File name of the aggregate artifact.
pub const REGISTRY_FILE_NAME: &str = "init-models.ts";

/// Render every recorded entity and association, in record order.
pub fn emit_registry(entries: &[RegistryEntry], config: &EmitConfig) -> Artifact {
    let mut w = IndentWriter::new(&config.indent);

    w.write_comment("Generated by modelsmith. Do not edit.");
    w.write_line("import { Sequelize } from 'sequelize-typescript';");
    for entry in entries {
        w.write_line(&format!(
            "import {} from './{}.model';",
            entry.entity, entry.entity
        ));
    }
    w.blank_line();

    w.block(
        "export async function initModels(sequelize: Sequelize) {",
        "}",
        |w| {
            w.block("sequelize.addModels([", "]);", |w| {
                for entry in entries {
                    w.write_line(&format!("{},", entry.entity));
                }
            });
            w.blank_line();
            w.write_line("await sequelize.authenticate();");
            w.write_line("await sequelize.sync();");

            let wired: Vec<String> = entries
                .iter()
                .flat_map(|entry| {
                    entry.relationships.iter().map(move |rel| {
                        format!(
                            "{}.{}({}, {});",
                            entry.entity,
                            rel.kind.association_name(),
                            rel.target_entity,
                            association_options(rel)
                        )
                    })
                })
                .collect();
            if !wired.is_empty() {
                w.blank_line();
                for line in &wired {
                    w.write_line(line);
                }
            }

            w.blank_line();
            w.block("return {", "};", |w| {
                for entry in entries {
                    w.write_line(&format!("{},", entry.entity));
                }
            });
        },
    );
    w.blank_line();
    w.write_line("export type Models = Awaited<ReturnType<typeof initModels>>;");

    Artifact {
        file_name: REGISTRY_FILE_NAME.to_string(),
        contents: w.into_string(),
    }
}
