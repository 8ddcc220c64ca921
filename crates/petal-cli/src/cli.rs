use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to a JSON configuration file. Defaults apply to every missing field.")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn models_dir_arg(short: char) -> Arg {
    Arg::new("models_dir")
        .short(short)
        .long("models")
        .help("Directory holding the trained model, encoder and scaler files. Overrides the configuration file.")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::DirPath)
}

fn descriptor_choice() -> [&'static str; 2] {
    ["hog", "lab"]
}

pub fn build_cli() -> Command {
    Command::new("petal")
        .version(clap::crate_version!())
        .about("\u{1F33C} Petal CLI - HOG and LAB descriptor image classification")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Extract features from a labelled image directory and train one SVM per descriptor")
                .arg(config_arg())
                .arg(
                    Arg::new("dataset_dir")
                        .short('d')
                        .long("dataset")
                        .help("Dataset root with one subdirectory per class. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(models_dir_arg('o'))
                .arg(
                    Arg::new("descriptor")
                        .long("descriptor")
                        .help("Descriptor(s) to train. Overrides the configuration file.")
                        .value_parser(descriptor_choice())
                        .action(ArgAction::Append)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("kernel")
                        .long("kernel")
                        .help("SVM kernel: linear, gauss or poly.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed of the train/test shuffle.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("test_ratio")
                        .long("test-ratio")
                        .help("Fraction of the images held out for evaluation.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify a single image with a trained model")
                .arg(
                    Arg::new("image")
                        .help("Image to classify (jpg, jpeg, png, bmp, tif, tiff)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(config_arg())
                .arg(models_dir_arg('m'))
                .arg(
                    Arg::new("descriptor")
                        .long("descriptor")
                        .help("Model to classify with.")
                        .value_parser(descriptor_choice()),
                )
                .arg(
                    Arg::new("top_k")
                        .long("top")
                        .help("Number of most probable classes to list.")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("interactive")
                .about("Start an interactive classification session")
                .arg(config_arg())
                .arg(models_dir_arg('m'))
                .arg(
                    Arg::new("descriptor")
                        .long("descriptor")
                        .help("Model selected at start.")
                        .value_parser(descriptor_choice()),
                ),
        )
        .subcommand(
            Command::new("prepare")
                .about("Reorganise numbered images into one directory per class using a label index file")
                .arg(config_arg())
                .arg(
                    Arg::new("images_dir")
                        .long("images")
                        .help("Directory holding image_00001.jpg, image_00002.jpg, ...")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("labels_file")
                        .long("labels")
                        .help("Label index file (csv, tsv, txt or json), one class id per image")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output")
                        .help("Output dataset root")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("num_classes")
                        .long("num-classes")
                        .help("Number of class directories to create")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
