use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// aaa : automatic analysis of seismic and acoustic events.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Longueur de FFT la plus proche, sans facteur premier >= 100.
    FftLength {
        /// Longueur du signal.
        n: usize,
    },

    /// Classe de chaque échantillon d'une matrice de probabilités (JSON).
    Classify {
        /// Fichier JSON : liste de lignes de scores.
        #[arg(long)]
        probs: PathBuf,

        /// Seuils par classe, séparés par des virgules. Active le rejet.
        #[arg(long, value_delimiter = ',')]
        threshold: Option<Vec<f64>>,
    },

    /// Affiche une matrice de confusion (JSON).
    Confusion {
        /// Fichier JSON : matrice carrée.
        #[arg(long)]
        matrix: PathBuf,

        /// Étiquettes des classes, séparées par des virgules.
        #[arg(long, value_delimiter = ',', required = true)]
        labels: Vec<String>,

        #[arg(long, default_value_t = false)]
        hide_zeroes: bool,

        #[arg(long, default_value_t = false)]
        hide_diagonal: bool,

        /// Masque les cellules <= cette valeur.
        #[arg(long)]
        hide_threshold: Option<f64>,

        /// Troncature des étiquettes de colonnes.
        #[arg(long, default_value_t = 10)]
        max_label_size: usize,

        /// Étiquettes complètes, colonnes à leur largeur.
        #[arg(long, default_value_t = false, conflicts_with = "max_label_size")]
        full_labels: bool,

        /// Une décimale (taux au lieu de comptes).
        #[arg(long, default_value_t = false)]
        float: bool,
    },

    /// Statistiques de durée par classe d'un catalogue (JSON).
    Catalog {
        /// Fichier JSON : liste de { "class", "length" }.
        path: PathBuf,
    },

    /// Filtre un enregistrement et écrit les échantillons en JSON.
    Filter {
        #[arg(long)]
        input: PathBuf,

        /// Coupure basse (Hz). Défaut : [filter] de la configuration.
        #[arg(long)]
        lowcut: Option<f64>,

        /// Coupure haute (Hz). Défaut : [filter] de la configuration.
        #[arg(long)]
        highcut: Option<f64>,

        /// Ordre du Butterworth.
        #[arg(long)]
        order: Option<usize>,

        /// Passe-haut FIR à --lowcut au lieu du passe-bande.
        #[arg(long, default_value_t = false)]
        fir: bool,

        #[arg(long)]
        out: PathBuf,
    },

    /// Matrice de features d'un lot d'enregistrements (JSON sur stdout).
    Features {
        /// Enregistrements, tous au même taux d'échantillonnage.
        #[arg(long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Nombre de bandes d'octave.
        #[arg(long, default_value_t = 8)]
        bands: usize,
    },

    /// Spectrogramme d'une observation avec son cadre.
    Spectrogram {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        fmin: f64,

        #[arg(long)]
        fmax: f64,

        /// Durée de l'observation (s), qui commence à cette même date.
        #[arg(long)]
        window_t: f64,

        #[arg(long, default_value = "")]
        title: String,

        /// Chemin de la figure, sans extension.
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 1500)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        /// BMP au lieu de PNG.
        #[arg(long, default_value_t = false)]
        bmp: bool,
    },
}
