//! Entity → model class emission.

use super::format::{quote_property, quote_string, IndentWriter};
use super::{association_options, model_file_name, Artifact, EmitConfig};
use crate::catalog::ColumnDefault;
use crate::inference::{Relationship, RelationshipKind};
use crate::model::{EntityColumn, EntityDescription};

/// Association decorators in import order.
const ASSOCIATION_KINDS: [RelationshipKind; 4] = [
    RelationshipKind::ManyToOne,
    RelationshipKind::OneToOne,
    RelationshipKind::OneToMany,
    RelationshipKind::ManyToMany,
];

/// Render an entity as `<Entity>.model.ts`.
pub fn emit_entity(entity: &EntityDescription, config: &EmitConfig) -> Artifact {
    let mut w = IndentWriter::new(&config.indent);

    w.write_comment("Generated by modelsmith. Do not edit.");
    w.write_line(&import_line(entity));
    for name in entity.imports() {
        w.write_line(&format!("import {} from './{}.model';", name, name));
    }
    w.blank_line();

    w.write_line(&format!(
        "@Table({{ tableName: {}, timestamps: {} }})",
        quote_string(&entity.table),
        config.timestamps
    ));
    w.block(
        &format!("export default class {} extends Model {{", entity.entity_name),
        "}",
        |w| {
            let mut first = true;
            for column in &entity.columns {
                if !first {
                    w.blank_line();
                }
                first = false;
                emit_column(w, column);
            }
            for rel in &entity.relationships {
                if !first {
                    w.blank_line();
                }
                first = false;
                emit_association(w, rel);
            }
        },
    );

    Artifact {
        file_name: model_file_name(&entity.entity_name),
        contents: w.into_string(),
    }
}

fn import_line(entity: &EntityDescription) -> String {
    let mut names = Vec::new();
    if entity
        .columns
        .iter()
        .any(|c| matches!(c.column.default, ColumnDefault::Expression(_)))
    {
        names.push("Sequelize");
    }
    names.extend(["Table", "Column", "Model", "DataType"]);
    for kind in ASSOCIATION_KINDS {
        if entity.relationships.iter().any(|r| r.kind == kind) {
            names.push(kind.decorator_name());
        }
    }
    format!("import {{ {} }} from 'sequelize-typescript';", names.join(", "))
}

/// Rendered `defaultValue`, if the column gets one.
///
/// An explicit NULL only renders on a nullable column.
fn default_value(column: &EntityColumn) -> Option<String> {
    match &column.column.default {
        ColumnDefault::Absent => None,
        ColumnDefault::Null if column.column.nullable => Some("null".to_string()),
        ColumnDefault::Null => None,
        ColumnDefault::Expression(expr) => Some(format!("Sequelize.literal({})", quote_string(expr))),
    }
}

fn emit_column(w: &mut IndentWriter, column: &EntityColumn) {
    let mut options = vec![
        format!("type: DataType.{}", column.field_type.sequelize_type()),
        format!("allowNull: {}", column.column.nullable),
    ];
    if column.column.primary_key {
        options.push("primaryKey: true".to_string());
    }
    if column.column.auto_increment {
        options.push("autoIncrement: true".to_string());
    }
    if column.is_renamed() {
        options.push(format!("field: {}", quote_string(&column.column.name)));
    }
    if let Some(value) = default_value(column) {
        options.push(format!("defaultValue: {}", value));
    }

    w.block("@Column({", "})", |w| {
        for option in &options {
            w.write_line(&format!("{},", option));
        }
    });
    w.write_line(&format!(
        "declare {}: {};",
        quote_property(&column.field_name),
        column.field_type.ts_type()
    ));
}

fn emit_association(w: &mut IndentWriter, rel: &Relationship) {
    w.write_line(&format!(
        "@{}(() => {}, {})",
        rel.kind.decorator_name(),
        rel.target_entity,
        association_options(rel)
    ));
    let property_type = if rel.kind.is_collection() {
        format!("{}[]", rel.target_entity)
    } else {
        rel.target_entity.clone()
    };
    w.write_line(&format!(
        "declare {}: {};",
        quote_property(&rel.property_name),
        property_type
    ));
}
